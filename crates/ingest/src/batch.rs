use std::slice::Chunks;

/// # Summary
/// 将记录切分为固定大小的批次。
///
/// # Invariants
/// - 除最后一批外，每批恰好 `size` 条；最后一批为余数。
/// - 按顺序拼接全部批次等于原列表，不丢失也不重复。
/// - `size` 为 0 时按 1 处理。
pub fn chunks<T>(records: &[T], size: usize) -> Chunks<'_, T> {
    records.chunks(size.max(1))
}

/// 给定记录数与批大小时的批次数。
pub fn batch_count(len: usize, size: usize) -> usize {
    len.div_ceil(size.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remainder_in_last_chunk() {
        let records = [1, 2, 3, 4, 5];
        let sizes: Vec<usize> = chunks(&records, 2).map(<[i32]>::len).collect();
        assert_eq!(sizes, vec![2, 2, 1]);
        assert_eq!(batch_count(records.len(), 2), 3);
    }

    #[test]
    fn test_zero_size_treated_as_one() {
        let records = ["a", "b"];
        assert_eq!(chunks(&records, 0).count(), 2);
        assert_eq!(batch_count(0, 0), 0);
    }
}
