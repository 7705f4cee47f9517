//! Cross-reference resolution for decode.
//!
//! Record codecs construct abstract objects in a first pass, recording the
//! raw indices they read (contact index, group-list index, …) rather than
//! resolving them immediately — at construction time the referenced list
//! may not have been decoded yet. [`LinkContext`] accumulates those
//! deferred references and resolves them in a second pass, dropping any
//! that turn out to be dangling.

use crate::error::{Diagnostic, RecordKind, Severity};

/// Accumulates diagnostics raised while resolving deferred references.
#[derive(Default)]
pub struct LinkContext {
    pub diagnostics: Vec<Diagnostic>,
}

impl LinkContext {
    pub fn new() -> Self {
        LinkContext::default()
    }

    /// Resolve a single optional deferred reference against `len`, the
    /// length of the target list. Returns `None` (and records a warning)
    /// if `raw_index` is out of range; the caller's field becomes `None`.
    pub fn resolve_optional(
        &mut self,
        referrer: RecordKind,
        referrer_index: usize,
        target: RecordKind,
        raw_index: usize,
        len: usize,
    ) -> Option<usize> {
        if raw_index < len {
            Some(raw_index)
        } else {
            self.diagnostics.push(Diagnostic::new(
                Severity::Warning,
                referrer,
                referrer_index,
                format!(
                    "dropped dangling reference to {} #{} (only {} present)",
                    target, raw_index, len
                ),
            ));
            None
        }
    }

    /// Resolve a single optional deferred reference whose presence was
    /// already tested against a mask rather than a dense count (needed when
    /// the target list's full count isn't known yet at resolution time, as
    /// with a channel's scan-list reference — scan lists are decoded after
    /// channels because scan-list membership itself references channels).
    pub fn resolve_present(
        &mut self,
        referrer: RecordKind,
        referrer_index: usize,
        target: RecordKind,
        raw_index: usize,
        present: bool,
    ) -> Option<usize> {
        if present {
            Some(raw_index)
        } else {
            self.diagnostics.push(Diagnostic::new(
                Severity::Warning,
                referrer,
                referrer_index,
                format!("dropped dangling reference to {} #{} (slot not present)", target, raw_index),
            ));
            None
        }
    }

    /// Resolve an ordered list of deferred member references, dropping any
    /// dangling ones in place (preserving relative order of the survivors).
    pub fn resolve_members(
        &mut self,
        referrer: RecordKind,
        referrer_index: usize,
        target: RecordKind,
        raw_indices: &[usize],
        len: usize,
    ) -> Vec<usize> {
        raw_indices
            .iter()
            .filter_map(|&raw| self.resolve_optional(referrer, referrer_index, target, raw, len))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_range_reference_resolves() {
        let mut ctx = LinkContext::new();
        let resolved = ctx.resolve_optional(RecordKind::Channel, 0, RecordKind::DigitalContact, 2, 5);
        assert_eq!(resolved, Some(2));
        assert!(ctx.diagnostics.is_empty());
    }

    #[test]
    fn out_of_range_reference_is_dropped_with_warning() {
        let mut ctx = LinkContext::new();
        let resolved = ctx.resolve_optional(RecordKind::ScanList, 4, RecordKind::Channel, 2500, 3);
        assert_eq!(resolved, None);
        assert_eq!(ctx.diagnostics.len(), 1);
        assert_eq!(ctx.diagnostics[0].severity, Severity::Warning);
    }

    #[test]
    fn member_list_keeps_order_and_drops_dangling() {
        let mut ctx = LinkContext::new();
        let resolved = ctx.resolve_members(
            RecordKind::GroupList,
            0,
            RecordKind::DigitalContact,
            &[0, 99, 1],
            2,
        );
        assert_eq!(resolved, vec![0, 1]);
        assert_eq!(ctx.diagnostics.len(), 1);
    }
}
