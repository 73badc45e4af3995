use super::State;
use crate::utils::Result;
use std::collections::HashSet;

#[derive(Debug, Clone)]
pub struct IslandParams {
    pub carrier: State,
    pub interruption: State,
    pub min_subsequence: usize,
}

impl IslandParams {
    pub fn new(carrier: State, interruption: State, min_subsequence: usize) -> Result<Self> {
        if !carrier.is_canonical() || !interruption.is_canonical() {
            return Err(format!(
                "Island states must be canonical, got carrier {} and interruption {}",
                carrier, interruption
            ));
        }
        if carrier == interruption {
            return Err(format!("Carrier and interruption are both {}", carrier));
        }
        if min_subsequence == 0 {
            return Err("Minimum interruption length must be at least 1".to_string());
        }
        Ok(IslandParams {
            carrier,
            interruption,
            min_subsequence,
        })
    }
}

impl Default for IslandParams {
    fn default() -> Self {
        IslandParams {
            carrier: State::Tuf,
            interruption: State::Deletion,
            min_subsequence: 1,
        }
    }
}

/// Scan position over the path. Matches move it by variable amounts.
#[derive(Debug, Default)]
struct Cursor {
    pos: usize,
}

impl Cursor {
    fn advance_by(&mut self, n: usize) {
        self.pos += n;
    }

    fn jump_to(&mut self, pos: usize) {
        debug_assert!(pos >= self.pos);
        self.pos = pos;
    }
}

/// Finds interruption runs flanked by carrier runs (TUF-Deletion-TUF islands).
///
/// `path` holds the canonical state of every window, position `i` being window `i`.
/// Returns the members of all islands as `(position, state)` in scan order; grouping
/// into segments is left to [`assemble_segments`](super::assemble_segments).
///
/// Carrier runs that close an island are remembered so that the next island does
/// not report them again as its leading run. Leading runs are not remembered.
pub fn find_islands(path: &[State], params: &IslandParams) -> Vec<(usize, State)> {
    let mut members = Vec::new();
    let len = path.len();
    if len == 0 {
        return members;
    }

    let carrier = params.carrier;
    let interruption = params.interruption;
    let width = params.min_subsequence;

    let mut included: HashSet<usize> = HashSet::new();
    let mut num_islands = 0;
    let mut cursor = Cursor::default();

    // The last window never starts a scan window: nothing follows it
    while cursor.pos + 1 < len {
        let pos = cursor.pos;
        if path[pos] != interruption {
            cursor.advance_by(1);
            continue;
        }
        if pos + width >= len {
            break;
        }

        let window = &path[pos..pos + width];
        if !window.iter().all(|&s| s == interruption) {
            cursor.advance_by(1);
            continue;
        }

        let carrier_before = pos > 0 && path[pos - 1] == carrier;
        let mut after = pos + width;
        if !carrier_before {
            cursor.advance_by(1);
            continue;
        }

        let mut interruption_len = width;
        if path[after] == interruption {
            let extension = run_length_fwd(path, after, interruption);
            after += extension;
            if after >= len {
                log::debug!(
                    "Interruption run at window {} reaches the end of the path",
                    pos
                );
                break;
            }
            if path[after] != carrier {
                cursor.jump_to(after);
                continue;
            }
            interruption_len += extension;
        } else if path[after] != carrier {
            cursor.advance_by(1);
            continue;
        }

        let before_len = run_length_bwd(path, pos - 1, carrier);
        let after_len = run_length_fwd(path, after, carrier);

        // Leading run already reported as the closing run of the previous island
        if !included.contains(&(pos - 1)) {
            members.extend((pos - before_len..pos).map(|i| (i, carrier)));
        }
        members.extend((pos..pos + interruption_len).map(|i| (i, interruption)));
        members.extend((after..after + after_len).map(|i| (i, carrier)));
        included.extend(after..after + after_len);
        num_islands += 1;

        cursor.advance_by(interruption_len + after_len);
    }

    log::debug!(
        "Found {} {}-{}-{} islands over {} windows",
        num_islands,
        carrier,
        interruption,
        carrier,
        len
    );
    members
}

/// Number of consecutive `state` windows starting at `from` going forward.
fn run_length_fwd(path: &[State], from: usize, state: State) -> usize {
    path[from..].iter().take_while(|&&s| s == state).count()
}

/// Number of consecutive `state` windows ending at `to` (inclusive) going backward.
fn run_length_bwd(path: &[State], to: usize, state: State) -> usize {
    path[..=to].iter().rev().take_while(|&&s| s == state).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use State::{Deletion as D, NormalI as N, Tuf as T};

    fn indices(members: &[(usize, State)]) -> Vec<usize> {
        members.iter().map(|m| m.0).collect()
    }

    #[test]
    fn simple_island_is_collected_whole() {
        let path = [T, T, D, T, T];
        let members = find_islands(&path, &IslandParams::default());
        assert_eq!(members, vec![(0, T), (1, T), (2, D), (3, T), (4, T)]);
    }

    #[test]
    fn extended_interruption_with_trailing_carrier_is_an_island() {
        let path = [N, T, D, D, D, T, N];
        let members = find_islands(&path, &IslandParams::default());
        assert_eq!(indices(&members), vec![1, 2, 3, 4, 5]);
        assert_eq!(members[3].1, D);
    }

    #[test]
    fn extended_interruption_without_trailing_carrier_is_skipped() {
        let path = [T, D, D, N, T, D, T];
        let members = find_islands(&path, &IslandParams::default());
        assert_eq!(members, vec![(4, T), (5, D), (6, T)]);
    }

    #[test]
    fn interruption_without_leading_carrier_is_skipped() {
        let path = [N, D, T, T];
        assert!(find_islands(&path, &IslandParams::default()).is_empty());
        // the first window has nothing before it
        let path = [D, T, T];
        assert!(find_islands(&path, &IslandParams::default()).is_empty());
    }

    #[test]
    fn interruption_at_end_of_path_is_never_an_island() {
        let path = [T, T, D];
        assert!(find_islands(&path, &IslandParams::default()).is_empty());
        let path = [T, D, D];
        assert!(find_islands(&path, &IslandParams::default()).is_empty());
    }

    #[test]
    fn shared_carrier_run_is_reported_once() {
        let path = [T, D, T, T, D, T];
        let members = find_islands(&path, &IslandParams::default());
        assert_eq!(indices(&members), vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn wider_window_must_be_pure() {
        let params = IslandParams::new(T, D, 2).unwrap();
        assert_eq!(indices(&find_islands(&[T, D, D, T], &params)), vec![0, 1, 2, 3]);
        // a single deletion is too short for the window
        assert!(find_islands(&[T, D, T, T], &params).is_empty());
        // exact width at the end of the path has no room after it
        assert!(find_islands(&[T, T, D, D], &params).is_empty());
    }

    #[test]
    fn no_interruption_means_no_islands() {
        let path = [T, T, N, N, T];
        assert!(find_islands(&path, &IslandParams::default()).is_empty());
        assert!(find_islands(&[], &IslandParams::default()).is_empty());
    }

    #[test]
    fn interruption_windows_are_pure_and_members_unique() {
        let path = [N, T, D, T, D, D, T, N, T, D, N, T, T, D, T, D];
        let members = find_islands(&path, &IslandParams::default());
        let mut seen = HashSet::new();
        for (i, state) in &members {
            assert!(seen.insert(*i), "window {} reported twice", i);
            assert_eq!(path[*i], *state);
        }
        assert_eq!(indices(&members), vec![1, 2, 3, 4, 5, 6, 11, 12, 13, 14]);
    }

    #[test]
    fn params_reject_degenerate_configurations() {
        assert!(IslandParams::new(T, T, 1).is_err());
        assert!(IslandParams::new(T, D, 0).is_err());
        assert!(IslandParams::new(State::TufDup, D, 1).is_err());
    }
}
