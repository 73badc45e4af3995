use super::State;
use crate::utils::Result;

/// Coordinate-bearing block of consecutive island members sharing one state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub start_index: usize,
    pub start: u64,
    pub end: u64,
    pub span: u64,
    pub state: State,
}

/// Groups island members into segments.
///
/// A block continues while the state is unchanged and each position is exactly one
/// more than the previous one. `windows[i]` holds the genomic `(start, end)` of
/// position `i`. Spans count both ends, so a single window is never zero-length.
pub fn assemble_segments(members: &[(usize, State)], windows: &[(u64, u64)]) -> Result<Vec<Segment>> {
    let mut segments = Vec::new();
    if members.is_empty() {
        log::debug!("No island members to assemble");
        return Ok(segments);
    }

    let mut block_start = 0;
    for i in 1..=members.len() {
        let breaks = i == members.len()
            || members[i].1 != members[i - 1].1
            || members[i].0 != members[i - 1].0 + 1;
        if breaks {
            segments.push(make_segment(&members[block_start..i], windows)?);
            block_start = i;
        }
    }
    Ok(segments)
}

fn make_segment(block: &[(usize, State)], windows: &[(u64, u64)]) -> Result<Segment> {
    let window = |index: usize| {
        windows.get(index).copied().ok_or_else(|| {
            format!(
                "Island member {} is outside the decoded path of {} windows",
                index,
                windows.len()
            )
        })
    };
    let (first_index, state) = block[0];
    let (last_index, _) = block[block.len() - 1];
    let start = window(first_index)?.0;
    let end = window(last_index)?.1;
    if end < start {
        return Err(format!(
            "Segment at window {} ends before it starts: {}-{}",
            first_index, start, end
        ));
    }
    Ok(Segment {
        start_index: first_index,
        start,
        end,
        span: end - start + 1,
        state,
    })
}
