#[cfg(test)]
mod tests {
    use starforge::model::{fuse, fuse_by, mean_confidence, Candidate, DataType, TypeTag};
    use std::collections::BTreeSet;

    fn candidates(values: &[(&str, f64)]) -> Vec<Candidate<String>> {
        values
            .iter()
            .map(|(v, c)| Candidate::new(v.to_string(), *c))
            .collect()
    }

    #[test]
    fn test_repeated_value_beats_single_stronger_value() {
        // (0.6 + 0.9) / 2 = 0.75 > 0.7
        let fused = fuse(&candidates(&[("OrderID", 0.6), ("OrderID", 0.9), ("Column_1", 0.7)]))
            .unwrap();
        assert_eq!(fused.value, "OrderID");
        assert!((fused.confidence - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_single_stronger_value_beats_weak_repeats() {
        // (0.2 + 0.4) / 2 = 0.3 < 0.5
        let fused = fuse(&candidates(&[("A", 0.2), ("A", 0.4), ("B", 0.5)])).unwrap();
        assert_eq!(fused.value, "B");
        assert_eq!(fused.confidence, 0.5);
    }

    #[test]
    fn test_empty_input_has_no_value() {
        let empty: Vec<Candidate<String>> = Vec::new();
        assert!(fuse(&empty).is_none());
    }

    #[test]
    fn test_tie_keeps_first_encountered_value() {
        let fused = fuse(&candidates(&[("Second", 0.5), ("First", 0.5)])).unwrap();
        assert_eq!(fused.value, "Second");

        let fused = fuse(&candidates(&[("First", 0.5), ("Second", 0.5)])).unwrap();
        assert_eq!(fused.value, "First");
    }

    #[test]
    fn test_datatype_candidates_fuse_on_full_type() {
        let varchar_10 = DataType::new(TypeTag::VarChar).with_length(10);
        let varchar_20 = DataType::new(TypeTag::VarChar).with_length(20);
        let fused = fuse(&[
            Candidate::new(varchar_10, 0.5),
            Candidate::new(varchar_20, 0.6),
            Candidate::new(varchar_10, 0.8),
        ])
        .unwrap();
        // varchar(10) averages 0.65 and beats varchar(20) at 0.6
        assert_eq!(fused.value, varchar_10);
    }

    #[test]
    fn test_key_sets_fuse_regardless_of_order() {
        let a: Vec<u32> = vec![1, 2];
        let b: Vec<u32> = vec![2, 1];
        let c: Vec<u32> = vec![3];
        let fused = fuse_by(
            &[
                Candidate::new(a, 0.4),
                Candidate::new(c, 0.5),
                Candidate::new(b, 0.8),
            ],
            |x, y| x.iter().collect::<BTreeSet<_>>() == y.iter().collect::<BTreeSet<_>>(),
        )
        .unwrap();
        assert_eq!(fused.value, vec![1, 2]);
        assert!((fused.confidence - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_mean_confidence() {
        let mean = mean_confidence(vec![0.9, 0.7, 0.2]).unwrap();
        assert!((mean - 0.6).abs() < 1e-9);
        assert_eq!(mean_confidence(Vec::<f64>::new()), None);
    }
}
