pub(crate) mod add_sigma;
pub(crate) mod batch_rmsd;
pub(crate) mod bfactor;
pub(crate) mod bfactor_compare;
pub(crate) mod close_residues;
pub(crate) mod cooccurrence;
pub(crate) mod distances;
pub(crate) mod find_chain;
pub(crate) mod find_pairs;
pub(crate) mod histogram;
pub(crate) mod op_compare;
pub(crate) mod op_heatmap;
pub(crate) mod rename_chains;
pub(crate) mod rmsd;
pub(crate) mod rmsd_plot;
