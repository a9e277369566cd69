use super::error::TreeError;
use super::policy::CombinePolicy;

/// 区間`[range_left, range_right]`を担当するノード
///
/// `aggregate`は`pending`を適用済みの値. `pending`はまだ子に伝えていない更新.
#[derive(Clone)]
struct Node<V> {
    range_left: usize,
    range_right: usize,
    aggregate: V,
    pending: Option<V>,
}

impl<V> Node<V> {
    fn is_leaf(&self) -> bool {
        self.range_left == self.range_right
    }

    fn mid(&self) -> usize {
        self.range_left + (self.range_right - self.range_left) / 2
    }
}

const fn left_child(index: usize) -> usize {
    2 * index + 1
}

const fn right_child(index: usize) -> usize {
    2 * index + 2
}

/// 遅延伝搬セグメントツリー
///
/// 長さ`n`の列に対して一点更新・区間更新・区間取得を*O*(log *n*)で行う.
/// ノードは長さ`4n`の配列に置かれ, 添字`i`のノードの子は`2i+1`と`2i+2`である.
///
/// 区間更新は「区間の全ての要素を`value`にする」操作で, その集約値は
/// [`CombinePolicy::apply_over_range`]で決まる.
#[derive(Clone)]
pub struct LazySegmentTree<P: CombinePolicy>(Box<[Node<P::Value>]>, usize, P);

impl<P: CombinePolicy> LazySegmentTree<P> {
    /// 列`values`からLazySegmentTreeを構築する.
    ///
    /// # Errors
    ///
    /// - `4 * values.len()`個のノードを確保できない場合は[`TreeError::Construction`]
    ///
    /// # Time complexity
    ///
    /// - *O*(*n*)
    pub fn new(policy: P, values: Vec<P::Value>) -> Result<Self, TreeError> {
        let len = values.len();

        #[cfg(feature = "tracing")]
        let span = tracing::debug_span!("build", len);
        #[cfg(feature = "tracing")]
        let _enter = span.enter();

        let slots = len
            .checked_mul(4)
            .ok_or(TreeError::Construction { len })?;
        let mut nodes = Vec::new();
        nodes
            .try_reserve_exact(slots)
            .map_err(|_| TreeError::Construction { len })?;
        nodes.resize_with(slots, || Node {
            range_left: 0,
            range_right: 0,
            aggregate: policy.identity(),
            pending: None,
        });

        let mut tree = Self(nodes.into_boxed_slice(), len, policy);
        if len > 0 {
            tree.build(0, 0, len - 1, &mut values.into_iter());
        }
        Ok(tree)
    }

    /// 葉は左から順に訪れるので, `values`の先頭から順に割り当てていく
    fn build(
        &mut self,
        index: usize,
        left: usize,
        right: usize,
        values: &mut impl Iterator<Item = P::Value>,
    ) {
        let node = &mut self.0[index];
        node.range_left = left;
        node.range_right = right;
        if left == right {
            if let Some(value) = values.next() {
                node.aggregate = value;
            }
            return;
        }
        let mid = node.mid();
        self.build(left_child(index), left, mid, values);
        self.build(right_child(index), mid + 1, right, values);
        self.pull_up(index);
    }

    /// 列の長さを返す.
    ///
    /// # Time complexity
    ///
    /// - *O*(1)
    #[must_use]
    pub fn len(&self) -> usize {
        self.1
    }

    /// 列が空かどうか判定する
    ///
    /// # Time complexity
    ///
    /// - *O*(1)
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.1 == 0
    }

    /// `index`番目の要素を`value`で上書きする.
    ///
    /// # Errors
    ///
    /// - `index >= self.len()`なら[`TreeError::OutOfRange`]. このとき列は変化しない.
    ///
    /// # Time complexity
    ///
    /// - *O*(log *n*)
    pub fn update(&mut self, index: usize, value: P::Value) -> Result<(), TreeError> {
        self.check_range(index, index)?;
        self.update_node(0, index, value);
        Ok(())
    }

    fn update_node(&mut self, index: usize, target: usize, value: P::Value) {
        self.push_down(index);
        let node = &mut self.0[index];
        if node.is_leaf() {
            node.aggregate = value;
            return;
        }
        if target <= node.mid() {
            self.update_node(left_child(index), target, value);
        } else {
            self.update_node(right_child(index), target, value);
        }
        self.pull_up(index);
    }

    /// 区間`[left, right]`の全ての要素を`value`にする.
    ///
    /// # Errors
    ///
    /// - `left > right`または`right >= self.len()`なら[`TreeError::OutOfRange`]. このとき列は変化しない.
    ///
    /// # Time complexity
    ///
    /// - *O*(log *n*)
    pub fn batch_update(
        &mut self,
        left: usize,
        right: usize,
        value: P::Value,
    ) -> Result<(), TreeError> {
        self.check_range(left, right)?;

        #[cfg(feature = "tracing")]
        let span = tracing::debug_span!("batch_update", left, right);
        #[cfg(feature = "tracing")]
        let _enter = span.enter();

        self.batch_update_node(0, left, right, &value);
        Ok(())
    }

    fn batch_update_node(&mut self, index: usize, left: usize, right: usize, value: &P::Value) {
        let node = &self.0[index];
        if node.range_left == left && node.range_right == right {
            // 既存の保留値は上書きされるので先に下ろさなくてよい
            self.apply_node(index, value);
            return;
        }
        let mid = node.mid();
        self.push_down(index);
        if right <= mid {
            self.batch_update_node(left_child(index), left, right, value);
        } else if left > mid {
            self.batch_update_node(right_child(index), left, right, value);
        } else {
            self.batch_update_node(left_child(index), left, mid, value);
            self.batch_update_node(right_child(index), mid + 1, right, value);
        }
        self.pull_up(index);
    }

    /// 区間`[left, right]`の要素を左から順に`merge`した値を返す.
    ///
    /// 保留中の更新を子に伝えるので`&mut self`をとる.
    ///
    /// # Errors
    ///
    /// - `left > right`または`right >= self.len()`なら[`TreeError::OutOfRange`]
    ///
    /// # Time complexity
    ///
    /// - *O*(log *n*)
    pub fn search(&mut self, left: usize, right: usize) -> Result<P::Value, TreeError> {
        self.check_range(left, right)?;
        Ok(self.search_node(0, left, right))
    }

    fn search_node(&mut self, index: usize, left: usize, right: usize) -> P::Value {
        let node = &self.0[index];
        if node.range_left == left && node.range_right == right {
            return node.aggregate.clone();
        }
        let mid = node.mid();
        self.push_down(index);
        if right <= mid {
            self.search_node(left_child(index), left, right)
        } else if left > mid {
            self.search_node(right_child(index), left, right)
        } else {
            let lhs = self.search_node(left_child(index), left, mid);
            let rhs = self.search_node(right_child(index), mid + 1, right);
            self.2.merge(&lhs, &rhs)
        }
    }

    /// `index`番目の要素を返す.
    ///
    /// # Errors
    ///
    /// - `index >= self.len()`なら[`TreeError::OutOfRange`]
    ///
    /// # Time complexity
    ///
    /// - *O*(log *n*)
    pub fn get(&mut self, index: usize) -> Result<P::Value, TreeError> {
        self.search(index, index)
    }

    /// `index`番目の要素を木を変更せずに返す.
    ///
    /// # Errors
    ///
    /// - `index >= self.len()`なら[`TreeError::OutOfRange`]
    ///
    /// # Time complexity
    ///
    /// - *O*(log *n*)
    pub fn get_imu(&self, index: usize) -> Result<P::Value, TreeError> {
        self.check_range(index, index)?;
        // 根に近い保留値ほど新しいので, 最初に見つかったものが値を決める
        let mut node = &self.0[0];
        let mut i = 0;
        while !node.is_leaf() {
            if let Some(f) = &node.pending {
                return Ok(self.2.apply_over_range(index, index, f));
            }
            i = if index <= node.mid() {
                left_child(i)
            } else {
                right_child(i)
            };
            node = &self.0[i];
        }
        Ok(node.aggregate.clone())
    }

    /// `range`の範囲の要素を左から順に`merge`した値を返す. 空の区間なら単位元を返す.
    ///
    /// # Errors
    ///
    /// - `range`が`0..self.len()`に含まれないなら[`TreeError::RangeOutOfBounds`]
    ///
    /// # Time complexity
    ///
    /// - *O*(log *n*)
    pub fn prod(
        &mut self,
        range: impl std::ops::RangeBounds<usize>,
    ) -> Result<P::Value, TreeError> {
        match self.to_closed(range)? {
            Some((left, right)) => Ok(self.search_node(0, left, right)),
            None => Ok(self.2.identity()),
        }
    }

    /// `range`の範囲の全ての要素を`value`にする. 空の区間なら何もしない.
    ///
    /// # Errors
    ///
    /// - `range`が`0..self.len()`に含まれないなら[`TreeError::RangeOutOfBounds`]
    ///
    /// # Time complexity
    ///
    /// - *O*(log *n*)
    pub fn apply(
        &mut self,
        range: impl std::ops::RangeBounds<usize>,
        value: P::Value,
    ) -> Result<(), TreeError> {
        match self.to_closed(range)? {
            Some((left, right)) => self.batch_update(left, right, value),
            None => Ok(()),
        }
    }

    /// 全ての要素を`value`にする.
    ///
    /// # Time complexity
    ///
    /// - *O*(1)
    pub fn fill(&mut self, value: P::Value) {
        if !self.is_empty() {
            self.apply_node(0, &value);
        }
    }

    /// 現在の列を`Vec`として返す.
    ///
    /// # Time complexity
    ///
    /// - *O*(*n*)
    #[must_use]
    pub fn to_vec(&mut self) -> Vec<P::Value> {
        let mut out = Vec::with_capacity(self.1);
        if !self.is_empty() {
            self.collect(0, &mut out);
        }
        out
    }

    fn collect(&mut self, index: usize, out: &mut Vec<P::Value>) {
        self.push_down(index);
        if self.0[index].is_leaf() {
            out.push(self.0[index].aggregate.clone());
            return;
        }
        self.collect(left_child(index), out);
        self.collect(right_child(index), out);
    }

    /// ノード`index`の区間全体に`value`を適用し, 子へ伝える分を保留値にする.
    /// 古い保留値は上書きされる.
    fn apply_node(&mut self, index: usize, value: &P::Value) {
        let node = &mut self.0[index];
        node.aggregate = self
            .2
            .apply_over_range(node.range_left, node.range_right, value);
        node.pending = Some(value.clone());
    }

    fn push_down(&mut self, index: usize) {
        let Some(value) = self.0[index].pending.take() else {
            return;
        };
        if self.0[index].is_leaf() {
            return;
        }
        self.apply_node(left_child(index), &value);
        self.apply_node(right_child(index), &value);
    }

    fn pull_up(&mut self, index: usize) {
        let val = self.2.merge(
            &self.0[left_child(index)].aggregate,
            &self.0[right_child(index)].aggregate,
        );
        self.0[index].aggregate = val;
    }

    fn check_range(&self, left: usize, right: usize) -> Result<(), TreeError> {
        if left <= right && right < self.1 {
            return Ok(());
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(left, right, len = self.1, "rejected out-of-range access");

        Err(TreeError::OutOfRange {
            left,
            right,
            len: self.1,
        })
    }

    /// `range`を閉区間`[left, right]`に直す. 空の区間なら`None`
    ///
    /// 範囲外なら呼び出し側が渡した端点のまま[`TreeError::RangeOutOfBounds`]を返す.
    fn to_closed(
        &self,
        range: impl std::ops::RangeBounds<usize>,
    ) -> Result<Option<(usize, usize)>, TreeError> {
        let start = range.start_bound().cloned();
        let end = range.end_bound().cloned();
        let err = TreeError::RangeOutOfBounds {
            start,
            end,
            len: self.1,
        };
        let left = match start {
            std::ops::Bound::Included(i) => Some(i),
            std::ops::Bound::Excluded(i) => i.checked_add(1),
            std::ops::Bound::Unbounded => Some(0),
        };
        let right = match end {
            std::ops::Bound::Included(i) => i.checked_add(1),
            std::ops::Bound::Excluded(i) => Some(i),
            std::ops::Bound::Unbounded => Some(self.1),
        };
        match (left, right) {
            (Some(left), Some(right)) if left <= right && right <= self.1 => {
                Ok((left < right).then(|| (left, right - 1)))
            }
            _ => {
                #[cfg(feature = "tracing")]
                tracing::debug!(?start, ?end, len = self.1, "rejected out-of-range access");

                Err(err)
            }
        }
    }
}

impl<P: CombinePolicy + Default> TryFrom<Vec<P::Value>> for LazySegmentTree<P> {
    type Error = TreeError;

    fn try_from(value: Vec<P::Value>) -> Result<Self, TreeError> {
        Self::new(P::default(), value)
    }
}

impl<P: CombinePolicy> std::fmt::Debug for LazySegmentTree<P>
where
    P::Value: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries((0..self.1).filter_map(|i| self.get_imu(i).ok()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{Max, Min, Sum};
    use std::ops::Bound::{Excluded, Included, Unbounded};

    #[test]
    fn sum() {
        let mut seg = LazySegmentTree::new(Sum::<i32>::default(), vec![1, 2, 3, 4]).unwrap();
        assert_eq!(seg.search(1, 2), Ok(5));
        seg.batch_update(0, 3, 7).unwrap();
        assert_eq!(seg.search(3, 3), Ok(7));
        seg.update(3, 8).unwrap();
        assert_eq!(seg.search(3, 3), Ok(8));
        assert_eq!(seg.search(0, 3), Ok(29));
        assert_eq!(seg.to_vec(), vec![7, 7, 7, 8]);
    }

    #[test]
    fn repeated_batch_update() {
        let mut seg = LazySegmentTree::new(Sum::<i64>::default(), vec![0; 10]).unwrap();
        seg.batch_update(0, 9, 7).unwrap();
        seg.batch_update(0, 9, 1).unwrap();
        assert_eq!(seg.search(0, 0), Ok(1));
        assert_eq!(seg.search(0, 9), Ok(10));
        seg.batch_update(2, 6, 3).unwrap();
        seg.batch_update(4, 8, -2).unwrap();
        assert_eq!(seg.to_vec(), vec![1, 1, 3, 3, -2, -2, -2, -2, -2, 1]);
        assert_eq!(seg.search(3, 5), Ok(-1));
        assert_eq!(seg.prod(..), Ok(-1));
    }

    #[test]
    fn out_of_range() {
        let mut seg = LazySegmentTree::new(Sum::<i32>::default(), vec![1, 2, 3, 4]).unwrap();
        fn err<T>(left: usize, right: usize) -> Result<T, TreeError> {
            Err(TreeError::OutOfRange { left, right, len: 4 })
        }
        assert_eq!(seg.update(4, 0), err(4, 4));
        assert_eq!(seg.batch_update(2, 1, 0), err(2, 1));
        assert_eq!(seg.batch_update(0, 4, 0), err(0, 4));
        assert_eq!(seg.search(3, 4), err(3, 4));
        assert_eq!(seg.get_imu(9), err(9, 9));
        let bounds_err = |start, end| {
            Err::<(), _>(TreeError::RangeOutOfBounds { start, end, len: 4 })
        };
        assert_eq!(seg.prod(2..9).map(drop), bounds_err(Included(2), Excluded(9)));
        assert_eq!(seg.apply(6..6, 1), bounds_err(Included(6), Excluded(6)));
        assert_eq!(seg.apply(3..2, 1), bounds_err(Included(3), Excluded(2)));
        assert_eq!(
            seg.prod(1..=usize::MAX).map(drop),
            bounds_err(Included(1), Included(usize::MAX))
        );
        assert_eq!(
            seg.apply((Excluded(usize::MAX), Unbounded), 1),
            bounds_err(Excluded(usize::MAX), Unbounded)
        );
        assert_eq!(seg.prod(4..4), Ok(0));
        assert_eq!(seg.to_vec(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn narrow_sum_type() {
        let mut seg = LazySegmentTree::new(Sum::<i8>::default(), vec![0; 128]).unwrap();
        seg.batch_update(0, 127, -1).unwrap();
        assert_eq!(seg.search(0, 127), Ok(-128));
        assert_eq!(seg.search(0, 63), Ok(-64));
        assert_eq!(seg.get_imu(100), Ok(-1));

        let mut seg = LazySegmentTree::new(Sum::<u8>::default(), vec![0; 300]).unwrap();
        seg.update(7, 200).unwrap();
        seg.batch_update(10, 265, 0).unwrap();
        assert_eq!(seg.prod(..), Ok(200));
        seg.batch_update(0, 299, 0).unwrap();
        seg.update(7, 200).unwrap();
        assert_eq!(seg.prod(..), Ok(200));
    }

    #[test]
    fn newer_batch_update_wins() {
        let mut seg = LazySegmentTree::new(Sum::<i32>::default(), vec![0; 16]).unwrap();
        // 深いノードに保留値を残してから, それを覆う区間を更新する
        seg.batch_update(4, 5, 9).unwrap();
        seg.batch_update(0, 7, 2).unwrap();
        assert_eq!(seg.get_imu(4), Ok(2));
        assert_eq!(seg.search(4, 5), Ok(4));
        seg.batch_update(5, 5, 6).unwrap();
        seg.batch_update(0, 15, 1).unwrap();
        assert_eq!(seg.get_imu(5), Ok(1));
        assert_eq!(seg.search(0, 15), Ok(16));
        assert_eq!(seg.to_vec(), vec![1; 16]);
    }

    #[test]
    fn empty() {
        let mut seg = LazySegmentTree::new(Sum::<i32>::default(), vec![]).unwrap();
        assert!(seg.is_empty());
        assert_eq!(seg.len(), 0);
        assert!(seg.search(0, 0).is_err());
        assert!(seg.update(0, 1).is_err());
        assert_eq!(seg.prod(..), Ok(0));
        assert_eq!(seg.apply(.., 3), Ok(()));
        seg.fill(1);
        assert_eq!(seg.to_vec(), Vec::<i32>::new());
        assert_eq!(format!("{seg:?}"), "[]");
    }

    #[test]
    fn min_max() {
        let mut min = LazySegmentTree::new(Min::<i32>::default(), vec![5, 3, 8, 1, 9, 2]).unwrap();
        let mut max =
            LazySegmentTree::<Max<i32>>::try_from(vec![5, 3, 8, 1, 9, 2]).unwrap();
        assert_eq!(min.prod(0..3), Ok(3));
        assert_eq!(max.prod(3..), Ok(9));
        min.apply(1..=4, 6).unwrap();
        max.apply(1..=4, 6).unwrap();
        assert_eq!(min.prod(..), Ok(2));
        assert_eq!(max.prod(..), Ok(6));
        assert_eq!(min.get(3), Ok(6));
        assert_eq!(max.get_imu(4), Ok(6));
        assert_eq!(format!("{max:?}"), "[5, 6, 6, 6, 6, 2]");
    }

    #[test]
    fn get_imu_does_not_push() {
        let mut seg = LazySegmentTree::new(Sum::<i32>::default(), (0..13).collect()).unwrap();
        seg.batch_update(0, 12, 4).unwrap();
        seg.batch_update(3, 9, 1).unwrap();
        seg.fill(2);
        seg.batch_update(5, 5, 8).unwrap();
        let expected = [2, 2, 2, 2, 2, 8, 2, 2, 2, 2, 2, 2, 2];
        for (i, &e) in expected.iter().enumerate() {
            assert_eq!(seg.get_imu(i), Ok(e));
        }
        assert_eq!(seg.to_vec(), expected);
    }

    #[test]
    fn non_commutative() {
        #[derive(Default)]
        struct Concat;
        impl CombinePolicy for Concat {
            type Value = String;
            fn merge(&self, lhs: &String, rhs: &String) -> String {
                format!("{lhs}{rhs}")
            }
            fn apply_over_range(&self, left: usize, right: usize, value: &String) -> String {
                value.repeat(right - left + 1)
            }
            fn identity(&self) -> String {
                String::new()
            }
        }

        let mut seg =
            LazySegmentTree::<Concat>::try_from("abcdefg".chars().map(String::from).collect::<Vec<_>>())
                .unwrap();
        assert_eq!(seg.search(0, 6).as_deref(), Ok("abcdefg"));
        assert_eq!(seg.search(2, 4).as_deref(), Ok("cde"));
        seg.batch_update(1, 3, "x".to_string()).unwrap();
        assert_eq!(seg.search(0, 6).as_deref(), Ok("axxxefg"));
        seg.update(2, "yz".to_string()).unwrap();
        assert_eq!(seg.prod(..5).as_deref(), Ok("axyzxe"));
        assert_eq!(seg.prod(3..3).as_deref(), Ok(""));
    }
}
