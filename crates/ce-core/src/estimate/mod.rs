//! Treatment effect estimators and model evaluation.
//!
//! Everything here is a pure function of samples, variable metadata and
//! model query results.

pub mod cate;
pub mod evaluate;
pub mod ipw;
pub mod metrics;
pub mod regret;
pub mod rmse;
pub mod samples;

pub use cate::get_cate_from_samples;
pub use evaluate::{
    get_ate_rms, get_ite_evaluation_results, get_treatment_data_logprob, EvaluationOptions,
};
pub use ipw::{eval_test_quality_by_ate_error, get_ipw_estimated_ate, get_real_world_testing_assignment};
pub use metrics::{AteRmseMetrics, IteRmseMetrics, TreatmentDataLogProb};
pub use regret::calculate_regret;
pub use rmse::{calculate_group_rmse, calculate_per_group_rmse, calculate_rmse};
pub use samples::{
    filter_effect_columns, get_ate_from_samples, get_ite_from_samples, get_mask_from_idxs,
    normalise_data, Scale,
};
