use strata_dataframe::{ComputeOptions, DataFrame, Partitioned, from_frame, from_frame_with_divisions, from_series};
use strata_frame::compute::Reduction;
use strata_frame::groupby::GroupKeys;
use strata_frame::{Column, Frame, Index};
use strata_scalar::Scalar;

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(values: &[i64]) -> Vec<Scalar> {
        values.iter().map(|&v| Scalar::from(v)).collect()
    }

    fn local() -> Frame {
        Frame::from_columns([
            ("a", Column::from(vec![1, 2, 3, 4, 5, 6, 7, 8, 9])),
            ("b", Column::from(vec![4, 5, 6, 3, 2, 1, 0, 0, 0])),
        ])
        .unwrap()
        .with_index(Index::from(Column::from(vec![0, 1, 3, 5, 6, 8, 9, 9, 9])))
        .unwrap()
    }

    /// Three partitions on divisions `[0, 4, 9, 9]`.
    fn fixture() -> DataFrame {
        from_frame_with_divisions(&local(), &labels(&[0, 4, 9, 9])).unwrap()
    }

    fn sync() -> ComputeOptions {
        ComputeOptions::sync()
    }

    #[test]
    fn fixture_partitions() {
        let df = fixture();
        assert_eq!(df.npartitions(), 3);
        let sizes: Vec<usize> = (0..3)
            .map(|i| df.get_division(i).unwrap().compute_with(&sync()).unwrap().len())
            .collect();
        assert_eq!(sizes, vec![3, 3, 3]);
        assert_eq!(df.len().unwrap(), 9);
    }

    #[test]
    fn loc_range_trims_divisions() {
        let df = fixture();
        let sliced = df.loc_range(Some(&3.into()), Some(&8.into())).unwrap();
        let divisions = sliced.divisions().values().unwrap();
        assert_eq!(divisions.first(), Some(&Scalar::from(3)));
        assert_eq!(divisions.last(), Some(&Scalar::from(8)));
        let rows = sliced.compute_with(&sync()).unwrap();
        assert_eq!(rows.column("a").unwrap().values(), &Column::from(vec![3, 4, 5, 6]));
    }

    #[test]
    fn repartition_splits_and_merges() {
        let frame = Frame::from_columns([
            ("x", Column::from(vec![10, 20, 30, 40, 50, 60, 70])),
            ("y", Column::from(vec![1.5, 2.5, 3.5, 4.5, 5.5, 6.5, 7.5])),
            ("z", Column::from(vec!["a", "b", "c", "d", "e", "f", "g"])),
        ])
        .unwrap()
        .with_index(Index::from(Column::from(vec![1, 2, 3, 4, 5, 6, 7])))
        .unwrap();
        let df = from_frame_with_divisions(&frame, &labels(&[1, 3, 7])).unwrap();
        let moved = df.repartition(&labels(&[1, 4, 6, 7]), false).unwrap();
        assert_eq!(moved.npartitions(), 3);
        let task_labels = moved.graph().task_labels();
        assert!(task_labels.contains("repartition-split"));
        assert!(task_labels.contains("repartition-merge"));

        let partition = |i: usize| {
            moved
                .get_division(i)
                .unwrap()
                .compute_with(&sync())
                .unwrap()
                .index()
                .labels()
                .clone()
        };
        assert_eq!(partition(0), Column::from(vec![1, 2, 3]));
        assert_eq!(partition(1), Column::from(vec![4, 5]));
        assert_eq!(partition(2), Column::from(vec![6, 7]));

        let back = moved.repartition(&labels(&[1, 3, 7]), false).unwrap();
        for i in 0..2 {
            assert_eq!(
                back.get_division(i).unwrap().compute_with(&sync()).unwrap(),
                df.get_division(i).unwrap().compute_with(&sync()).unwrap()
            );
        }
    }

    #[test]
    fn repartition_round_trip_keeps_boundary_rows() {
        let df = fixture();
        let index_of = |df: &DataFrame, i: usize| {
            df.get_division(i).unwrap().compute_with(&sync()).unwrap().index().labels().clone()
        };
        let coarse = df.repartition(&labels(&[0, 5, 9]), false).unwrap();
        assert_eq!(index_of(&coarse, 0), Column::from(vec![0, 1, 3]));
        assert_eq!(index_of(&coarse, 1), Column::from(vec![5, 6, 8, 9, 9, 9]));

        let back = coarse.repartition(&labels(&[0, 4, 9, 9]), false).unwrap();
        assert_eq!(back.divisions(), df.divisions());
        assert_eq!(index_of(&back, 0), Column::from(vec![0, 1, 3]));
        assert_eq!(index_of(&back, 1), Column::from(vec![5, 6, 8]));
        assert_eq!(index_of(&back, 2), Column::from(vec![9, 9, 9]));
        assert_eq!(
            back.compute_with(&sync()).unwrap(),
            df.compute_with(&sync()).unwrap()
        );
    }

    #[test]
    fn groupby_mean_ignores_partitioning() {
        let direct = local()
            .column("a")
            .unwrap()
            .groupby_reduce(
                &GroupKeys::single(Some("b".into()), local().column("b").unwrap().values().clone()),
                Reduction::Mean,
            )
            .unwrap();
        assert_eq!(
            direct.values(),
            &Column::from(vec![8.0, 6.0, 5.0, 4.0, 1.0, 2.0, 3.0])
        );

        for df in [fixture(), from_frame(&local(), 2).unwrap(), from_frame(&local(), 5).unwrap()] {
            let means = df
                .groupby("b")
                .unwrap()
                .column("a")
                .unwrap()
                .mean()
                .unwrap()
                .compute_with(&sync())
                .unwrap();
            assert_eq!(means.index().labels(), direct.index().labels());
            assert_eq!(means.values(), direct.values());
        }
    }

    #[test]
    fn set_partition_uses_inclusive_boundaries() {
        let df = fixture();
        let partitioned = df.set_partition("b", &labels(&[0, 2, 9]), false).unwrap();
        assert_eq!(partitioned.npartitions(), 2);
        assert_eq!(partitioned.divisions().values(), Some(&labels(&[0, 2, 9])[..]));
        let graph_labels = partitioned.graph().task_labels();
        assert!(graph_labels.contains("set-partition-split"));
        assert!(graph_labels.contains("set-partition-collect"));

        let first = partitioned.get_division(0).unwrap().compute_with(&sync()).unwrap();
        assert_eq!(first.index().labels(), &Column::from(vec![0, 0, 0, 1, 2]));
        assert_eq!(first.column("a").unwrap().values(), &Column::from(vec![7, 8, 9, 6, 5]));
        let second = partitioned.get_division(1).unwrap().compute_with(&sync()).unwrap();
        assert_eq!(second.index().labels(), &Column::from(vec![3, 4, 5, 6]));
    }

    #[test]
    fn drop_duplicates_across_boundaries() {
        let values = vec![1, 2, 2, 2, 3, 3, 3, 1, 4];
        let series = strata_frame::Series::new(Some("v".into()), Column::from(values));
        let lazy = from_series(&series, 3).unwrap();
        assert_eq!(lazy.npartitions(), 3);

        let distinct = lazy.drop_duplicates().unwrap();
        assert!(distinct.graph().task_labels().contains("drop-duplicates"));
        let mut got = distinct.compute_with(&sync()).unwrap().values().values().to_vec();
        got.sort();
        let mut expected = series.drop_duplicates().unwrap().values().values().to_vec();
        expected.sort();
        assert_eq!(got, expected);
        assert_eq!(got, labels(&[1, 2, 3, 4]));
    }

    #[test]
    fn names_are_deterministic() {
        let a = fixture().column("a").unwrap();
        assert_eq!(a.sum().unwrap().key(), fixture().column("a").unwrap().sum().unwrap().key());
        assert_ne!(a.sum().unwrap().key(), a.max().unwrap().key());
        assert_ne!(a.nlargest(2).unwrap().root_name(), a.nlargest(3).unwrap().root_name());
        assert_ne!(
            a.add_scalar(1).unwrap().root_name(),
            a.add_scalar(2).unwrap().root_name()
        );
    }

    #[test]
    fn head_reads_leading_partitions() {
        let df = fixture();
        assert_eq!(df.head(4).unwrap().len(), 4);
        assert_eq!(df.head(20).unwrap().len(), 9);
        assert_eq!(df.tail(2).unwrap().index().labels(), &Column::from(vec![9, 9]));
    }
}
