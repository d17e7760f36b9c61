use crate::model::TraceEvent;

/// Assign nesting depths to a start-sorted event slice. Returns the maximum
/// depth assigned (0 for an empty slice).
///
/// A single pass keeps a stack of indices of still-open events. Before each
/// event, entries that ended at or before its start are popped from the top;
/// the event's depth is the number of entries left. Partially overlapping
/// siblings stack as if nested.
pub(crate) fn assign_depths(events: &mut [TraceEvent]) -> u32 {
    let mut open: Vec<usize> = Vec::new();
    let mut max_depth = 0;

    for i in 0..events.len() {
        let start = events[i].start_time;
        while let Some(&top) = open.last() {
            if events[top].end_time() <= start {
                open.pop();
            } else {
                break;
            }
        }

        let depth = open.len() as u32;
        events[i].depth = depth;
        max_depth = max_depth.max(depth);
        open.push(i);
    }

    max_depth
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EventId, Phase};

    fn span(start: f64, duration: Option<f64>) -> TraceEvent {
        TraceEvent {
            id: EventId(0),
            name: "s".into(),
            category: None,
            phase: Phase::Complete,
            start_time: start,
            duration,
            process_id: 1,
            thread_id: 1,
            args: None,
            depth: u32::MAX,
        }
    }

    fn depths(events: &[TraceEvent]) -> Vec<u32> {
        events.iter().map(|e| e.depth).collect()
    }

    #[test]
    fn empty_slice() {
        assert_eq!(assign_depths(&mut []), 0);
    }

    #[test]
    fn nested_call_stack() {
        let mut events = vec![
            span(0.0, Some(100.0)),
            span(10.0, Some(50.0)),
            span(20.0, Some(10.0)),
            span(70.0, Some(10.0)),
        ];
        assert_eq!(assign_depths(&mut events), 2);
        assert_eq!(depths(&events), vec![0, 1, 2, 1]);
    }

    #[test]
    fn touching_siblings_share_a_row() {
        let mut events = vec![span(0.0, Some(10.0)), span(10.0, Some(10.0))];
        assert_eq!(assign_depths(&mut events), 0);
        assert_eq!(depths(&events), vec![0, 0]);
    }

    #[test]
    fn partial_overlap_stacks() {
        let mut events = vec![span(0.0, Some(10.0)), span(5.0, Some(10.0))];
        assert_eq!(assign_depths(&mut events), 1);
        assert_eq!(depths(&events), vec![0, 1]);
    }

    #[test]
    fn only_the_top_is_popped() {
        // The short middle span is still on the stack under the long one when
        // the last event starts, so the last event lands one row deeper than a
        // slot-reusing packer would put it.
        let mut events = vec![
            span(0.0, Some(100.0)),
            span(0.0, Some(5.0)),
            span(1.0, Some(50.0)),
            span(10.0, Some(1.0)),
        ];
        assign_depths(&mut events);
        assert_eq!(depths(&events), vec![0, 1, 2, 3]);
    }

    #[test]
    fn instant_events_close_immediately() {
        let mut events = vec![span(0.0, Some(100.0)), span(10.0, None), span(20.0, Some(5.0))];
        assert_eq!(assign_depths(&mut events), 1);
        assert_eq!(depths(&events), vec![0, 1, 1]);
    }
}
