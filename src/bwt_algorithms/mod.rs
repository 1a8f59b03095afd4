//! The bwt_algorithms module forms the critical sorting subsystem of the bzip2 engine.
//!
//! bzip2 uses the Burrow-Wheeler Transform (BWT) to prepare data for compression. This transform alters the data in such
//! a way that runs of similar bytes are more likely to occur. This allows for more effective compression.
//!
//! The Burrow-Wheeler Transform requires "computationally expensive" sorting. A multikey quicksort handles most
//! data quickly; SA-IS takes over for small blocks and whenever the quicksort spends more than the work factor allows.
//!
pub mod bwt_sort;
pub mod sais;
