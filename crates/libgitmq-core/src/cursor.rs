//! Delivery-cursor computation
//!
//! Pure functions over parsed file names; the git layer is not involved. The
//! effective cursor of a node is its checkpoint with the greatest order key.
//! Everything strictly after the cursor (and not itself a checkpoint) is
//! pending. A message that shares an order key with the cursor is considered
//! already delivered.

use crate::types::filename::LogFileName;

/// The latest checkpoint written by `node`, if any.
pub fn find_cursor(files: &[LogFileName], node: &str) -> Option<LogFileName> {
    files
        .iter()
        .filter(|f| f.is_checkpoint_for(node))
        .max()
        .cloned()
}

/// Messages pending for `node`, in delivery order.
///
/// With no cursor every non-checkpoint file is pending (first run).
pub fn plan_delivery(files: &[LogFileName], node: &str) -> Vec<LogFileName> {
    let cursor = find_cursor(files, node);

    let mut pending: Vec<LogFileName> = files
        .iter()
        .filter(|f| !f.is_checkpoint())
        .filter(|f| match &cursor {
            Some(c) => f.order_key > c.order_key,
            None => true,
        })
        .cloned()
        .collect();
    pending.sort();
    pending
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(raw: &[&str]) -> Vec<LogFileName> {
        raw.iter().map(|s| s.parse().unwrap()).collect()
    }

    #[test]
    fn test_first_run_delivers_everything_in_order() {
        let files = names(&["30_p_E.json", "10_p_E.json", "20_p_E.json"]);
        let pending = plan_delivery(&files, "c1");
        let keys: Vec<u64> = pending.iter().map(|f| f.order_key).collect();
        assert_eq!(keys, vec![10, 20, 30]);
    }

    #[test]
    fn test_cursor_drops_everything_up_to_checkpoint() {
        let files = names(&[
            "10_p_E.json",
            "20_p_E.json",
            "20_c1_OK.json",
            "30_p_E.json",
            "40_p_E.json",
        ]);
        let pending = plan_delivery(&files, "c1");
        let keys: Vec<u64> = pending.iter().map(|f| f.order_key).collect();
        assert_eq!(keys, vec![30, 40]);
    }

    #[test]
    fn test_latest_of_several_checkpoints_wins() {
        let files = names(&[
            "10_p_E.json",
            "15_c1_OK.json",
            "20_p_E.json",
            "25_c1_OK.json",
            "30_p_E.json",
        ]);
        let cursor = find_cursor(&files, "c1").unwrap();
        assert_eq!(cursor.order_key, 25);

        let pending = plan_delivery(&files, "c1");
        let keys: Vec<u64> = pending.iter().map(|f| f.order_key).collect();
        assert_eq!(keys, vec![30]);
    }

    #[test]
    fn test_other_nodes_checkpoints_are_ignored_as_cursor_but_never_delivered() {
        let files = names(&[
            "10_p_E.json",
            "15_c2_OK.json",
            "20_p_E.json",
        ]);
        // c2's checkpoint is not c1's cursor...
        let pending = plan_delivery(&files, "c1");
        let keys: Vec<u64> = pending.iter().map(|f| f.order_key).collect();
        assert_eq!(keys, vec![10, 20]);
        // ...and checkpoint files are never part of a batch.
        assert!(pending.iter().all(|f| !f.is_checkpoint()));
    }

    #[test]
    fn test_nothing_new_after_checkpoint_is_empty() {
        let files = names(&["10_p_E.json", "50_c1_OK.json"]);
        assert!(plan_delivery(&files, "c1").is_empty());
    }

    #[test]
    fn test_empty_topic_is_empty() {
        assert!(plan_delivery(&[], "c1").is_empty());
        assert!(find_cursor(&[], "c1").is_none());
    }
}
