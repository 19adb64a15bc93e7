//! Fixed column layout of the results report.
//!
//! The order and width of these columns are read by downstream scripts, so
//! the list is append-only.

/// Report columns, in on-disk order.
///
/// The solver reports `time_confirm_chroma`, but the report keeps the
/// historical `time_confirm_crit` header; the former is therefore never
/// picked up.
pub const SCHEMA: [&str; 43] = [
    "instance",
    "k",
    "n_red",
    "m_red",
    "n",
    "m",
    "heu_timelimit",
    "exact_timelimit",
    "do_confirm_crit",
    "confirm_timelimit",
    "R",
    "reltg_size",
    "do_heu",
    "ss",
    "ss_gen_1st",
    "ss_fin_1st",
    "chroma_k_early",
    "chroma_k",
    "crit_early",
    "crit",
    "edges",
    "time",
    "time_pp",
    "time_confirm_crit",
    "time_color",
    "iter",
    "ttb",
    "itb",
    "max_iter_diff",
    "ss_fin_avg",
    "ss_gen_avg",
    "ss_gen_best",
    "num_size_att",
    "heu_mistakes",
    "num_pp",
    "avg_pp_reduced",
    "avg_pp_skipped",
    "calls_to_coloring",
    "num_gen_subsets",
    "infeas",
    "clique_start",
    "color_not_ok",
    "seed",
];

pub const IDENTIFIER_FIELD: &str = "instance";
pub const SEED_FIELD: &str = "seed";

/// Marker for missing, unparseable or failed values.
pub const NA: &str = "NA";
pub const AVG_LABEL: &str = "AVG";

/// Minimum width of every report cell.
pub const COLUMN_WIDTH: usize = 20;

/// Columns that are averaged, i.e. everything but the identifier.
pub fn aggregated_fields() -> impl Iterator<Item = &'static str> {
    SCHEMA.iter().copied().filter(|f| *f != IDENTIFIER_FIELD)
}
