//! Fixed-value scenarios run on both engines.
//!
//! `L = 8` doubles, `A = [1..8]`, `B = [8..1]`, `s = 2`.

use memstream::device::{HostGrid, LaunchShape};
use memstream::{AlignedVec, HostEngine, StreamArrays, StreamOp};

const S: f64 = 2.0;

fn a0() -> AlignedVec<f64> {
    AlignedVec::from_slice(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0])
}

fn b0() -> AlignedVec<f64> {
    AlignedVec::from_slice(&[8.0, 7.0, 6.0, 5.0, 4.0, 3.0, 2.0, 1.0])
}

fn engine() -> HostEngine {
    HostEngine::builder().threads(2).build().unwrap()
}

// 8 doubles are 4 lanes
fn shape() -> LaunchShape {
    LaunchShape::new(2, 2)
}

#[test]
fn test_copy_scenario() {
    let (mut a, mut b, mut c) = (a0(), b0(), AlignedVec::<f64>::zeroed(8));
    let mut arrays = StreamArrays::new(&mut a, &mut b, &mut c).unwrap();
    engine().run(StreamOp::Copy, &mut arrays, S);
    assert_eq!(arrays.c(), a0().as_slice());

    let grid = HostGrid::with_threads(2).unwrap();
    let mut tgt = AlignedVec::<f64>::zeroed(8);
    grid.copy(shape(), &mut tgt, &a0()).unwrap();
    assert_eq!(tgt.as_slice(), a0().as_slice());
}

#[test]
fn test_scale_scenario() {
    let expected = [16.0, 14.0, 12.0, 10.0, 8.0, 6.0, 4.0, 2.0];

    // Host Scale reads C: load it with B's values
    let (mut a, mut b, mut c) = (a0(), AlignedVec::<f64>::zeroed(8), b0());
    let mut arrays = StreamArrays::new(&mut a, &mut b, &mut c).unwrap();
    engine().run(StreamOp::Scale, &mut arrays, S);
    assert_eq!(arrays.b(), &expected);

    let grid = HostGrid::with_threads(2).unwrap();
    let mut tgt = AlignedVec::<f64>::zeroed(8);
    grid.scale(shape(), &mut tgt, &b0(), S).unwrap();
    assert_eq!(tgt.as_slice(), &expected);
}

#[test]
fn test_add_scenario() {
    let (mut a, mut b, mut c) = (a0(), b0(), a0());
    let mut arrays = StreamArrays::new(&mut a, &mut b, &mut c).unwrap();
    engine().run(StreamOp::Add, &mut arrays, S);
    assert_eq!(arrays.c(), &[9.0; 8]);

    let grid = HostGrid::with_threads(2).unwrap();
    let mut tgt = AlignedVec::<f64>::zeroed(8);
    grid.add(shape(), &mut tgt, &a0(), &b0()).unwrap();
    assert_eq!(tgt.as_slice(), &[9.0; 8]);
}

#[test]
fn test_triad_scenario() {
    let expected = [10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0, 17.0];

    // C holds A after Copy
    let (mut a, mut b, mut c) = (a0(), b0(), a0());
    let mut arrays = StreamArrays::new(&mut a, &mut b, &mut c).unwrap();
    engine().run(StreamOp::Triad, &mut arrays, S);
    assert_eq!(arrays.a(), &expected);

    let grid = HostGrid::with_threads(2).unwrap();
    let mut tgt = AlignedVec::<f64>::zeroed(8);
    grid.triad(shape(), &mut tgt, &a0(), &b0(), S).unwrap();
    assert_eq!(tgt.as_slice(), &expected);
}

#[test]
fn test_full_sequence_on_grid() {
    // Copy, Scale, Add, Triad in order over the same three arrays
    let grid = HostGrid::with_threads(3).unwrap();
    let (mut a, mut b, mut c) = (a0(), b0(), AlignedVec::<f64>::zeroed(8));
    let mut arrays = StreamArrays::new(&mut a, &mut b, &mut c).unwrap();

    grid.run(StreamOp::Copy, shape(), &mut arrays, S).unwrap();
    assert_eq!(arrays.c(), a0().as_slice());

    grid.run(StreamOp::Scale, shape(), &mut arrays, S).unwrap();
    assert_eq!(arrays.b(), &[2.0, 4.0, 6.0, 8.0, 10.0, 12.0, 14.0, 16.0]);

    grid.run(StreamOp::Add, shape(), &mut arrays, S).unwrap();
    assert_eq!(arrays.c(), &[3.0, 6.0, 9.0, 12.0, 15.0, 18.0, 21.0, 24.0]);

    grid.run(StreamOp::Triad, shape(), &mut arrays, S).unwrap();
    // A = B + 2C = 2i + 6i at 1-based index i
    assert_eq!(arrays.a(), &[8.0, 16.0, 24.0, 32.0, 40.0, 48.0, 56.0, 64.0]);
}

#[test]
fn test_empty_arrays() {
    let engine = HostEngine::builder()
        .threads(2)
        .parallel_threshold(0)
        .build()
        .unwrap();
    let grid = HostGrid::with_threads(2).unwrap();

    for op in StreamOp::ALL {
        let (mut a, mut b, mut c) = (Vec::<f64>::new(), Vec::<f64>::new(), Vec::<f64>::new());
        let mut arrays = StreamArrays::new(&mut a, &mut b, &mut c).unwrap();
        assert!(arrays.is_empty());

        engine.run(op, &mut arrays, S);
        arrays.run(op, S);
        grid.run(op, LaunchShape::new(0, 0), &mut arrays, S).unwrap();
        grid.run(op, LaunchShape::new(64, 0), &mut arrays, S).unwrap();
    }

    let mut tgt: Vec<f32> = Vec::new();
    grid.copy(LaunchShape::new(0, 0), &mut tgt, &[]).unwrap();
    assert!(tgt.is_empty());
}
