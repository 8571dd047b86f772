use proptest::prelude::*;
use volume_slicer::CoordinateTransform;

const PERMUTATIONS: [[i32; 3]; 6] = [
    [1, 2, 3],
    [1, 3, 2],
    [2, 1, 3],
    [2, 3, 1],
    [3, 1, 2],
    [3, 2, 1],
];

fn transform() -> impl Strategy<Value = CoordinateTransform> {
    (prop::sample::select(PERMUTATIONS.to_vec()), any::<[bool; 3]>()).prop_map(
        |(permutation, negate)| {
            let signed = [0, 1, 2].map(|i| if negate[i] { -permutation[i] } else { permutation[i] });
            CoordinateTransform::new(signed[0], signed[1], signed[2])
        },
    )
}

fn matrix_product(a: [[i32; 3]; 3], b: [[i32; 3]; 3]) -> [[i32; 3]; 3] {
    let mut out = [[0; 3]; 3];
    for (i, row) in out.iter_mut().enumerate() {
        for (j, cell) in row.iter_mut().enumerate() {
            *cell = (0..3).map(|k| a[i][k] * b[k][j]).sum();
        }
    }
    out
}

proptest! {
    #[test]
    fn test_inverse_undoes_integer_vectors(
        t in transform(),
        v in any::<[i16; 3]>()
    ) {
        let v = v.map(i32::from);
        prop_assert_eq!(t.apply(t.inverse().apply(v)), v);
        prop_assert_eq!(t.inverse().apply(t.apply(v)), v);
    }

    #[test]
    fn test_inverse_undoes_float_vectors(
        t in transform(),
        x in -1000.0f32..1000.0, y in -1000.0f32..1000.0, z in -1000.0f32..1000.0
    ) {
        let v = [x, y, z];
        prop_assert_eq!(t.apply_f32(t.inverse().apply_f32(v)), v);
        prop_assert_eq!(t.inverse().apply_f32(t.apply_f32(v)), v);
    }

    #[test]
    fn test_product_composes(
        t1 in transform(),
        t2 in transform(),
        v in any::<[i16; 3]>()
    ) {
        let v = v.map(i32::from);
        prop_assert_eq!(t1.product(&t2).apply(v), t1.apply(t2.apply(v)));
    }

    #[test]
    fn test_product_matches_matrix_multiply(t1 in transform(), t2 in transform()) {
        prop_assert_eq!(t1.product(&t2).matrix(), matrix_product(t1.matrix(), t2.matrix()));
    }

    #[test]
    fn test_product_with_inverse_is_identity(t in transform()) {
        prop_assert_eq!(t.product(&t.inverse()), CoordinateTransform::identity());
        prop_assert_eq!(t.inverse().inverse(), t);
    }
}
