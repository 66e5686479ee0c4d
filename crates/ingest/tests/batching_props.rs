use invsim_ingest::batch::{batch_count, chunks};
use proptest::prelude::*;

proptest! {
    /// 分批后按顺序拼接等于原列表。
    #[test]
    fn prop_chunks_rejoin_to_input(records in proptest::collection::vec(any::<u32>(), 0..500), size in 0usize..64) {
        let rejoined: Vec<u32> = chunks(&records, size).flatten().copied().collect();
        prop_assert_eq!(&rejoined, &records);
    }

    /// 除最后一批外每批恰好为批大小，批次数与 batch_count 一致。
    #[test]
    fn prop_chunk_sizes(len in 0usize..500, size in 1usize..64) {
        let records: Vec<usize> = (0..len).collect();
        let sizes: Vec<usize> = chunks(&records, size).map(<[usize]>::len).collect();

        prop_assert_eq!(sizes.len(), batch_count(len, size));
        if let Some((last, full)) = sizes.split_last() {
            prop_assert!(full.iter().all(|s| *s == size));
            prop_assert!(*last >= 1 && *last <= size);
        }
    }
}
