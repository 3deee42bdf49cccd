//! Tests for the GF(2) linear algebra

#[cfg(test)]
mod tests {
    use crate::gf2::{dot, dual, left_kernel, solve_left, vector_times, BinaryMatrix, Solution};
    use proptest::prelude::*;

    fn random_matrix(rows: usize, cols: usize, bits: &[bool]) -> BinaryMatrix {
        let mut m = BinaryMatrix::zeros(rows, cols);
        for r in 0..rows {
            for c in 0..cols {
                if bits[(r * cols + c) % bits.len()] ^ ((r * 7 + c * 3) % 5 == 0) {
                    m.set(r, c, true);
                }
            }
        }
        m
    }

    #[test]
    fn test_echelonize_is_reduced() {
        let mut m = BinaryMatrix::from_strings(&["1101", "1011", "0110", "1111"]).unwrap();
        let rank = m.echelonize();
        assert_eq!(rank, 3);
        let pivots = m.pivot_columns();
        assert_eq!(pivots, vec![0, 1, 2]);

        // Each pivot column holds a single one
        for (row, &p) in pivots.iter().enumerate() {
            for r in 0..m.rows() {
                assert_eq!(m.get(r, p), r == row);
            }
        }
        assert!(m.is_zero_row(3));
    }

    #[test]
    fn test_rank_cache_invalidated_on_mutation() {
        let mut m = BinaryMatrix::identity(4);
        assert_eq!(m.rank(), 4);
        m.set(3, 3, false);
        assert_eq!(m.rank(), 3);
        m.add_row(3, 0);
        assert_eq!(m.rank(), 3);
        m.set(3, 3, true);
        assert_eq!(m.rank(), 4);
        m.add_column(0, 3);
        assert_eq!(m.rank(), 4);
    }

    #[test]
    fn test_clone_is_deep() {
        let original = BinaryMatrix::from_strings(&["110", "011"]).unwrap();
        let mut copy = original.clone();
        copy.swap_columns(0, 2);
        copy.echelonize();
        assert_eq!(original, BinaryMatrix::from_strings(&["110", "011"]).unwrap());
    }

    #[test]
    fn test_wide_matrix_across_word_boundary() {
        let mut m = BinaryMatrix::zeros(3, 130);
        m.set(0, 0, true);
        m.set(0, 129, true);
        m.set(1, 64, true);
        m.set(1, 129, true);
        m.set(2, 0, true);
        m.set(2, 64, true);
        assert_eq!(m.rank(), 2);

        let t = m.transpose();
        assert_eq!(t.rows(), 130);
        assert!(t.get(129, 1));
        assert_eq!(t.transpose(), m);
    }

    #[test]
    fn test_block_composition() {
        let i2 = BinaryMatrix::identity(2);
        let z2 = BinaryMatrix::zeros(2, 2);
        let j = BinaryMatrix::block(&[&[&i2, &i2], &[&i2, &z2]]).unwrap();
        assert_eq!(
            j,
            BinaryMatrix::from_strings(&["1010", "0101", "1000", "0100"]).unwrap()
        );
        assert_eq!(j.rank(), 4);

        // J squared
        let jj = j.mul(&j).unwrap();
        assert_eq!(
            jj,
            BinaryMatrix::from_strings(&["0010", "0001", "1010", "0101"]).unwrap()
        );
    }

    #[test]
    fn test_submatrix_and_selection() {
        let m = BinaryMatrix::from_strings(&["1100", "0011", "1010"]).unwrap();
        assert_eq!(
            m.submatrix(1..3, 1..4),
            BinaryMatrix::from_strings(&["011", "010"]).unwrap()
        );
        assert_eq!(
            m.select_columns(&[3, 0]),
            BinaryMatrix::from_strings(&["01", "10", "01"]).unwrap()
        );
        assert_eq!(
            m.select_rows(&[2, 0]),
            BinaryMatrix::from_strings(&["1010", "1100"]).unwrap()
        );
        assert_eq!(m.row_range(1..2), BinaryMatrix::from_strings(&["0011"]).unwrap());
    }

    #[test]
    fn test_dimension_mismatch_is_reported() {
        let a = BinaryMatrix::zeros(2, 3);
        let b = BinaryMatrix::zeros(3, 3);
        assert!(a.hstack(&b).is_err());
        assert!(a.add(&b).is_err());
        assert!(a.mul(&a).is_err());
        assert!(a.vstack(&b).is_ok());
    }

    #[test]
    fn test_solve_left_found() {
        let a = BinaryMatrix::from_strings(&["1100", "0110", "0011"]).unwrap();
        let b = vec![true, false, false, true];
        match solve_left(&a, &b) {
            Solution::Found(x) => assert_eq!(vector_times(&x, &a), b),
            Solution::NoSolution => panic!("b is in the row space"),
        }
    }

    #[test]
    fn test_solve_left_no_solution() {
        let a = BinaryMatrix::from_strings(&["1100", "0110", "0011"]).unwrap();
        // Every row has even weight, so an odd-weight target is unreachable
        let b = vec![true, false, false, false];
        assert_eq!(solve_left(&a, &b), Solution::NoSolution);
    }

    #[test]
    fn test_solve_left_with_dependent_rows() {
        let a = BinaryMatrix::from_strings(&["101", "101", "010"]).unwrap();
        let b = vec![true, true, true];
        let Solution::Found(x) = solve_left(&a, &b) else {
            panic!("expected a solution");
        };
        assert_eq!(vector_times(&x, &a), b);
    }

    #[test]
    fn test_dual_of_hamming_parity_check() {
        let h = BinaryMatrix::from_strings(&["1010101", "0110011", "0001111"]).unwrap();
        let g = dual(&h);
        assert_eq!(g.rows(), 4);
        assert_eq!(g.rank(), 4);
        for i in 0..g.rows() {
            for j in 0..h.rows() {
                assert!(!dot(&g.row_bits(i), &h.row_bits(j)));
            }
        }
    }

    #[test]
    fn test_dual_edge_cases() {
        let zero = BinaryMatrix::zeros(3, 5);
        assert_eq!(dual(&zero), BinaryMatrix::identity(5));

        let full = BinaryMatrix::identity(4);
        let d = dual(&full);
        assert_eq!(d.rows(), 0);
        assert_eq!(d.cols(), 4);
    }

    #[test]
    fn test_left_kernel() {
        let m = BinaryMatrix::from_strings(&["10", "01", "11"]).unwrap();
        let k = left_kernel(&m);
        assert_eq!(k, BinaryMatrix::from_strings(&["111"]).unwrap());
        assert!(k.mul(&m).unwrap().is_zero());
    }

    proptest! {
        #[test]
        fn prop_dual_is_orthogonal_with_complementary_rank(
            rows in 1usize..10,
            cols in 1usize..24,
            bits in proptest::collection::vec(any::<bool>(), 1..240),
        ) {
            let m = random_matrix(rows, cols, &bits);
            let d = dual(&m);
            prop_assert_eq!(d.cols(), cols);
            prop_assert_eq!(d.rank(), cols - m.rank());
            prop_assert!(m.mul(&d.transpose()).unwrap().is_zero());
        }

        #[test]
        fn prop_solution_satisfies_system(
            rows in 1usize..8,
            cols in 1usize..16,
            bits in proptest::collection::vec(any::<bool>(), 1..128),
            x in proptest::collection::vec(any::<bool>(), 8),
        ) {
            let a = random_matrix(rows, cols, &bits);
            let b = vector_times(&x[..rows], &a);
            match solve_left(&a, &b) {
                Solution::Found(y) => prop_assert_eq!(vector_times(&y, &a), b),
                Solution::NoSolution => prop_assert!(false, "target built from the row space"),
            }
        }
    }
}
