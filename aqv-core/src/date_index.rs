use aqv_utils::dates::day_of_year;

/// Maps calendar (month, day) pairs onto row indices of a daily dataset
/// that starts on January 1st.
///
/// Indices are clamped to the dataset length, so a truncated dataset (one
/// that stops before December 31st) maps later dates onto its last row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateIndex {
    len: usize,
}

impl DateIndex {
    pub fn new(dataset_len: usize) -> Self {
        Self { len: dataset_len }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Largest valid index (0 for an empty dataset).
    pub fn last(&self) -> usize {
        self.len.saturating_sub(1)
    }

    /// Row index for (month 1-12, day 1-31).
    ///
    /// Days past the end of the month clamp to the month's last day; the
    /// result clamps to `[0, len - 1]`.
    pub fn index_from_date(&self, month: u32, day: u32) -> usize {
        self.clamp(day_of_year(month, day))
    }

    /// Clamp an arbitrary index into the dataset.
    pub fn clamp(&self, index: usize) -> usize {
        index.min(self.last())
    }

    /// Half-open row range covering `month` (1-12), truncated to the dataset.
    pub fn month_range(&self, month: u32) -> std::ops::Range<usize> {
        let start = day_of_year(month, 1);
        let end = start + aqv_utils::dates::days_in_month(month) as usize;
        start.min(self.len)..end.min(self.len)
    }
}
