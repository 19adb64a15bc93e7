//! Per-instance means over repetitions.

use crate::parser::ResultRecord;
use crate::schema::{aggregated_fields, NA, SEED_FIELD};
use std::collections::BTreeMap;

/// Numeric value at the start of `raw`, ignoring any trailing text.
///
/// Accepts an optional sign, digits with an optional fraction, and an
/// optional exponent. At least one digit is required, so `NA`, `inf` and
/// `nan` do not count, and neither does a prefix that overflows `f64`.
pub fn leading_number(raw: &str) -> Option<f64> {
    let bytes = raw.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    let int_digits = count_digits(&bytes[end..]);
    end += int_digits;
    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = count_digits(&bytes[end + 1..]);
        if int_digits > 0 || frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }
    if int_digits == 0 && frac_digits == 0 {
        return None;
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits = count_digits(&bytes[exp_end..]);
        if exp_digits > 0 {
            end = exp_end + exp_digits;
        }
    }
    raw[..end].parse::<f64>().ok().filter(|v| v.is_finite())
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FieldAccumulator {
    pub sum: f64,
    pub valid_count: usize,
}

impl FieldAccumulator {
    /// Adds `raw` if it has a numeric prefix; returns whether it counted.
    pub fn add(&mut self, raw: &str) -> bool {
        match leading_number(raw) {
            Some(v) => {
                self.sum += v;
                self.valid_count += 1;
                true
            }
            None => false,
        }
    }

    pub fn mean(&self) -> Option<f64> {
        if self.valid_count == 0 {
            None
        } else {
            Some(self.sum / self.valid_count as f64)
        }
    }
}

/// Accumulators for every averaged column of one instance.
#[derive(Debug, Clone)]
pub struct InstanceAggregate {
    fields: BTreeMap<&'static str, FieldAccumulator>,
    repetitions: usize,
}

impl InstanceAggregate {
    fn new() -> Self {
        Self {
            fields: aggregated_fields()
                .map(|f| (f, FieldAccumulator::default()))
                .collect(),
            repetitions: 0,
        }
    }

    fn observe(&mut self, record: &ResultRecord) {
        self.repetitions += 1;
        for (field, acc) in self.fields.iter_mut() {
            acc.add(record.get(field));
        }
    }

    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a ResultRecord>) -> Self {
        let mut aggregate = Self::new();
        for record in records {
            aggregate.observe(record);
        }
        aggregate
    }

    /// Repetitions observed, including failed ones.
    pub fn repetitions(&self) -> usize {
        self.repetitions
    }

    /// `None` for unknown fields, the identifier, and fields that never
    /// held a number.
    pub fn mean(&self, field: &str) -> Option<f64> {
        self.fields.get(field).and_then(FieldAccumulator::mean)
    }

    pub fn valid_count(&self, field: &str) -> usize {
        self.fields.get(field).map(|a| a.valid_count).unwrap_or(0)
    }
}

/// The seed shared by all completed repetitions, when there are at least two
/// and they all agree. Identical seeds mean the repetitions re-ran the same
/// random trajectory rather than sampling independently.
pub fn repeated_seed(records: &[ResultRecord]) -> Option<&str> {
    let mut seeds = records
        .iter()
        .map(|r| r.get(SEED_FIELD))
        .filter(|s| *s != NA);
    let first = seeds.next()?;
    let mut count = 1;
    for seed in seeds {
        if seed != first {
            return None;
        }
        count += 1;
    }
    (count >= 2).then_some(first)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_result_line;

    #[test]
    fn leading_number_is_permissive_about_suffixes() {
        assert_eq!(leading_number("12"), Some(12.0));
        assert_eq!(leading_number("1.5s"), Some(1.5));
        assert_eq!(leading_number("-3"), Some(-3.0));
        assert_eq!(leading_number("+.25"), Some(0.25));
        assert_eq!(leading_number("7."), Some(7.0));
        assert_eq!(leading_number("2e3ms"), Some(2000.0));
        assert_eq!(leading_number("4e"), Some(4.0));
        assert_eq!(leading_number("5e+x"), Some(5.0));
        assert_eq!(leading_number("NA"), None);
        assert_eq!(leading_number("nan"), None);
        assert_eq!(leading_number("inf"), None);
        assert_eq!(leading_number("x12"), None);
        assert_eq!(leading_number("."), None);
        assert_eq!(leading_number("-"), None);
        assert_eq!(leading_number(""), None);
        assert_eq!(leading_number("1e400"), None);
        assert_eq!(leading_number("-1e400s"), None);
        assert_eq!(leading_number("1e300"), Some(1e300));
    }

    #[test]
    fn mean_is_sum_over_valid_count() {
        let records: Vec<ResultRecord> = ["time=1.0", "time=2.0", "time=4.5"]
            .iter()
            .map(|l| parse_result_line(l))
            .collect();
        let aggregate = InstanceAggregate::from_records(&records);
        assert_eq!(aggregate.repetitions(), 3);
        assert_eq!(aggregate.valid_count("time"), 3);
        assert_eq!(format!("{:.2}", aggregate.mean("time").expect("mean")), "2.50");
    }

    #[test]
    fn field_absent_everywhere_has_no_mean() {
        let records = vec![parse_result_line("k=5"), parse_result_line("k=6")];
        let aggregate = InstanceAggregate::from_records(&records);
        assert_eq!(aggregate.mean("crit"), None);
        assert_eq!(aggregate.valid_count("crit"), 0);
        assert_eq!(aggregate.mean("instance"), None);
        assert_eq!(aggregate.mean("not_a_column"), None);
    }

    #[test]
    fn failed_repetitions_do_not_count() {
        let records = vec![
            parse_result_line("time=3 crit=NA"),
            ResultRecord::failed(),
            parse_result_line("time=5 crit=1"),
        ];
        let aggregate = InstanceAggregate::from_records(&records);
        assert_eq!(aggregate.repetitions(), 3);
        assert_eq!(aggregate.valid_count("time"), 2);
        assert_eq!(aggregate.mean("time"), Some(4.0));
        assert_eq!(aggregate.valid_count("crit"), 1);
        assert_eq!(aggregate.mean("crit"), Some(1.0));
    }

    #[test]
    fn aggregates_are_independent_per_instance() {
        let a = InstanceAggregate::from_records(&[parse_result_line("time=1")]);
        let b = InstanceAggregate::from_records(&[parse_result_line("time=9")]);
        assert_eq!(a.mean("time"), Some(1.0));
        assert_eq!(b.mean("time"), Some(9.0));
    }

    #[test]
    fn overflowing_values_are_not_averaged() {
        let records = vec![parse_result_line("time=1e400"), parse_result_line("time=2")];
        let aggregate = InstanceAggregate::from_records(&records);
        assert_eq!(aggregate.valid_count("time"), 1);
        assert_eq!(aggregate.mean("time"), Some(2.0));
    }

    #[test]
    fn repeated_seed_flags_identical_trials() {
        let same = vec![parse_result_line("seed=7"), parse_result_line("seed=7")];
        assert_eq!(repeated_seed(&same), Some("7"));

        let varied = vec![parse_result_line("seed=7"), parse_result_line("seed=8")];
        assert_eq!(repeated_seed(&varied), None);

        let single = vec![parse_result_line("seed=7"), ResultRecord::failed()];
        assert_eq!(repeated_seed(&single), None);
    }
}
