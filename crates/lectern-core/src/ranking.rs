use std::cmp::Ordering;

use crate::Candidate;

/// Order candidates by descending confidence.
///
/// Equal confidences fall back to source reliability (biblical, then corpus,
/// then unresolved) and then to insertion order. Candidates with identical
/// text from different sources are all kept.
pub fn rank(mut candidates: Vec<Candidate>) -> Vec<Candidate> {
    // `sort_by` is stable, which provides the insertion-order tie break.
    candidates.sort_by(compare);
    candidates
}

fn compare(a: &Candidate, b: &Candidate) -> Ordering {
    b.confidence.total_cmp(&a.confidence).then_with(|| {
        b.source
            .kind
            .reliability()
            .total_cmp(&a.source.kind.reliability())
    })
}

/// Keep at most `max` candidates. `None` keeps all of them.
pub fn truncate(mut candidates: Vec<Candidate>, max: Option<usize>) -> Vec<Candidate> {
    if let Some(max) = max {
        candidates.truncate(max);
    }
    candidates
}
