//! Field-shape merge rules shared by every structure.
//!
//! - Scalars: the child wins when set.
//! - Nested structs: an unset child inherits the parent's whole struct; when
//!   both are set they merge field by field.
//! - Replaceable lists and maps: ignored parent when the child replaces,
//!   otherwise a union (lists append parent items after the child's, maps keep
//!   the child's value per key).

use scheduler_spec::{ReplaceableMap, ReplaceableSlice};

use super::MergeError;

/// Scalar rule.
pub fn inherit<T: Clone>(child: &mut Option<T>, parent: &Option<T>) {
    if child.is_none() {
        child.clone_from(parent);
    }
}

/// Nested struct rule.
pub fn nested<T: Clone>(child: &mut Option<T>, parent: &Option<T>, merge: impl FnOnce(&mut T, &T)) {
    match (child.as_mut(), parent) {
        (None, Some(p)) => *child = Some(p.clone()),
        (Some(c), Some(p)) => merge(c, p),
        _ => {}
    }
}

/// Nested struct rule for merges that can fail.
pub fn try_nested<T: Clone>(
    child: &mut Option<T>,
    parent: &Option<T>,
    merge: impl FnOnce(&mut T, &T) -> Result<(), MergeError>,
) -> Result<(), MergeError> {
    match (child.as_mut(), parent) {
        (None, Some(p)) => {
            *child = Some(p.clone());
            Ok(())
        }
        (Some(c), Some(p)) => merge(c, p),
        _ => Ok(()),
    }
}

/// Replaceable list rule. Items are appended without de-duplication.
///
/// A `replace` on the parent carries over so that grandparents are ignored
/// too; this keeps `build` associative.
pub fn slice<T: Clone>(child: &mut ReplaceableSlice<T>, parent: &ReplaceableSlice<T>) {
    if child.replace {
        return;
    }
    child.entries.extend(parent.entries.iter().cloned());
    child.replace = parent.replace;
}

/// Replaceable map rule.
pub fn map<V: Clone>(child: &mut ReplaceableMap<V>, parent: &ReplaceableMap<V>) {
    if child.replace {
        return;
    }
    for (key, value) in &parent.entries {
        child
            .entries
            .entry(key.clone())
            .or_insert_with(|| value.clone());
    }
    child.replace = parent.replace;
}

/// Optional replaceable list.
pub fn opt_slice<T: Clone>(
    child: &mut Option<ReplaceableSlice<T>>,
    parent: &Option<ReplaceableSlice<T>>,
) {
    nested(child, parent, slice);
}

/// Optional replaceable map.
pub fn opt_map<V: Clone>(child: &mut Option<ReplaceableMap<V>>, parent: &Option<ReplaceableMap<V>>) {
    nested(child, parent, map);
}
