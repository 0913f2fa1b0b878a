pub use strata_dataframe::*;
pub use {
    strata_dtype as dtype, strata_error as error, strata_frame as frame, strata_graph as graph,
    strata_scalar as scalar,
};
