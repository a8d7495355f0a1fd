use crate::core::agent::Side;
use crate::core::matching::Matching;
use crate::core::preference::PreferenceModel;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Descriptive statistics on how well each side fared in a matching.
///
/// Ranks are 0-based: 0 means the agent got its first choice. Rank lists
/// cover matched pairs only and are ordered by ascending student id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SatisfactionReport {
    /// Rank each matched student gives its institution.
    pub student_ranks: Vec<usize>,
    /// Rank each matched institution gives its student.
    pub institution_ranks: Vec<usize>,
    /// 1.0 when every student got rank 0, 0.0 when every student got its last choice.
    pub student_satisfaction: f64,
    pub institution_satisfaction: f64,
    /// Mean of the two per-side scores.
    pub overall_satisfaction: f64,
    pub student_top_choices: usize,
    pub institution_top_choices: usize,
    /// Sum of all ranks on both sides.
    pub social_cost: usize,
    pub student_mean_rank: f64,
    pub institution_mean_rank: f64,
    pub student_median_rank: f64,
    pub institution_median_rank: f64,
    /// rank -> number of students.
    pub student_rank_histogram: BTreeMap<usize, usize>,
    /// rank -> number of institutions.
    pub institution_rank_histogram: BTreeMap<usize, usize>,
    pub student_count: usize,
    pub institution_count: usize,
}

/// Computes a [`SatisfactionReport`] from a matching and the preferences
/// it was produced from.
pub struct SatisfactionAnalyzer<'a> {
    model: &'a PreferenceModel,
    matching: &'a Matching,
}

impl<'a> SatisfactionAnalyzer<'a> {
    pub fn new(model: &'a PreferenceModel, matching: &'a Matching) -> Self {
        Self { model, matching }
    }

    /// Rank of each matched student's institution in that student's list.
    ///
    /// Pairs that fall outside `model` are skipped.
    pub fn student_ranks(&self) -> Vec<usize> {
        self.matching
            .pairs()
            .filter_map(|(s, i)| self.model.rank(Side::Students, s.index(), i.index()))
            .collect()
    }

    /// Rank of each matched institution's student in that institution's list.
    pub fn institution_ranks(&self) -> Vec<usize> {
        self.matching
            .pairs()
            .filter_map(|(s, i)| self.model.rank(Side::Institutions, i.index(), s.index()))
            .collect()
    }

    pub fn report(&self) -> SatisfactionReport {
        let student_ranks = self.student_ranks();
        let institution_ranks = self.institution_ranks();
        let student_count = self.model.student_count();
        let institution_count = self.model.institution_count();

        let student_satisfaction = normalized_satisfaction(&student_ranks, institution_count);
        let institution_satisfaction = normalized_satisfaction(&institution_ranks, student_count);

        SatisfactionReport {
            student_satisfaction,
            institution_satisfaction,
            overall_satisfaction: (student_satisfaction + institution_satisfaction) / 2.0,
            student_top_choices: top_choices(&student_ranks),
            institution_top_choices: top_choices(&institution_ranks),
            social_cost: student_ranks.iter().sum::<usize>() + institution_ranks.iter().sum::<usize>(),
            student_mean_rank: mean(&student_ranks),
            institution_mean_rank: mean(&institution_ranks),
            student_median_rank: median(&student_ranks),
            institution_median_rank: median(&institution_ranks),
            student_rank_histogram: histogram(&student_ranks),
            institution_rank_histogram: histogram(&institution_ranks),
            student_ranks,
            institution_ranks,
            student_count,
            institution_count,
        }
    }
}

/// Satisfaction in `[0, 1]` for ranks drawn from lists of `options` entries.
///
/// Returns 0.0 for an empty rank list and 1.0 when there is at most one
/// option to choose from.
pub fn normalized_satisfaction(ranks: &[usize], options: usize) -> f64 {
    if ranks.is_empty() {
        return 0.0;
    }
    if options <= 1 {
        return 1.0;
    }
    1.0 - mean(ranks) / (options - 1) as f64
}

/// Arithmetic mean, 0.0 when empty.
pub fn mean(ranks: &[usize]) -> f64 {
    if ranks.is_empty() {
        return 0.0;
    }
    ranks.iter().sum::<usize>() as f64 / ranks.len() as f64
}

/// Median, averaging the middle two for even lengths. 0.0 when empty.
pub fn median(ranks: &[usize]) -> f64 {
    if ranks.is_empty() {
        return 0.0;
    }
    let mut sorted = ranks.to_vec();
    sorted.sort_unstable();
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) as f64 / 2.0
    } else {
        sorted[mid] as f64
    }
}

pub fn histogram(ranks: &[usize]) -> BTreeMap<usize, usize> {
    let mut counts = BTreeMap::new();
    for &rank in ranks {
        *counts.entry(rank).or_insert(0) += 1;
    }
    counts
}

fn top_choices(ranks: &[usize]) -> usize {
    ranks.iter().filter(|&&r| r == 0).count()
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 * 100.0 / whole as f64
    }
}

const HISTOGRAM_BUCKETS: usize = 10;
const BAR_WIDTH: usize = 40;

fn write_histogram(f: &mut fmt::Formatter<'_>, histogram: &BTreeMap<usize, usize>) -> fmt::Result {
    if histogram.is_empty() {
        return writeln!(f, "  (no data)");
    }
    let overflow: usize = histogram.range(HISTOGRAM_BUCKETS..).map(|(_, c)| c).sum();
    let shown = histogram.keys().next_back().copied().unwrap_or(0).min(HISTOGRAM_BUCKETS - 1);
    let tallest = histogram.values().copied().max().unwrap_or(0).max(overflow).max(1);

    let bar = |count: usize| "█".repeat((count * BAR_WIDTH).div_ceil(tallest));
    for rank in 0..=shown {
        let count = histogram.get(&rank).copied().unwrap_or(0);
        writeln!(f, "  Rank {:>3}: {} ({})", rank, bar(count), count)?;
    }
    if overflow > 0 {
        writeln!(f, "  Rank {:>3}: {} ({})", format!("{}+", HISTOGRAM_BUCKETS), bar(overflow), overflow)?;
    }
    Ok(())
}

impl fmt::Display for SatisfactionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let matched = self.student_ranks.len();
        writeln!(f, "=== Satisfaction Report ===")?;
        writeln!(f, "Students:                  {}", self.student_count)?;
        writeln!(f, "Institutions:              {}", self.institution_count)?;
        writeln!(f, "Matched pairs:             {}", matched)?;
        writeln!(f, "Student satisfaction:      {:.2}%", self.student_satisfaction * 100.0)?;
        writeln!(f, "Institution satisfaction:  {:.2}%", self.institution_satisfaction * 100.0)?;
        writeln!(f, "Overall satisfaction:      {:.2}%", self.overall_satisfaction * 100.0)?;

        writeln!(f, "\n--- First choices ---")?;
        writeln!(
            f,
            "  Students:      {}/{} ({:.1}%)",
            self.student_top_choices,
            matched,
            percent(self.student_top_choices, matched)
        )?;
        writeln!(
            f,
            "  Institutions:  {}/{} ({:.1}%)",
            self.institution_top_choices,
            self.institution_ranks.len(),
            percent(self.institution_top_choices, self.institution_ranks.len())
        )?;

        writeln!(f, "\n--- Ranks ---")?;
        writeln!(f, "  Mean (students):       {:.2}", self.student_mean_rank)?;
        writeln!(f, "  Mean (institutions):   {:.2}", self.institution_mean_rank)?;
        writeln!(f, "  Median (students):     {:.1}", self.student_median_rank)?;
        writeln!(f, "  Median (institutions): {:.1}", self.institution_median_rank)?;
        writeln!(f, "  Social cost:           {}", self.social_cost)?;

        writeln!(f, "\n--- Student rank distribution ---")?;
        write_histogram(f, &self.student_rank_histogram)?;
        writeln!(f, "\n--- Institution rank distribution ---")?;
        write_histogram(f, &self.institution_rank_histogram)
    }
}
