//! 任意の結合演算に対する遅延伝搬セグメントツリー
//!
//! ```
//! use lazyseg::{LazySegmentTree, Sum};
//!
//! let mut seg = LazySegmentTree::new(Sum::<i32>::default(), vec![1, 2, 3, 4])?;
//! assert_eq!(seg.search(1, 2)?, 5);
//! seg.batch_update(0, 3, 7)?;
//! assert_eq!(seg.search(3, 3)?, 7);
//! seg.update(3, 8)?;
//! assert_eq!(seg.search(0, 3)?, 29);
//! # Ok::<(), lazyseg::TreeError>(())
//! ```

mod error;
mod lazysegtree;
mod policy;
pub mod util;

pub use error::TreeError;
pub use lazysegtree::LazySegmentTree;
pub use policy::{CombinePolicy, Max, Min, Sum};
