use crate::{
    bytecode::data_type::DataType,
    runtime::{
        container::{Binding, Container},
        error::VmError,
        vm::ExecutionUnit,
    },
};

#[test]
fn mov_copies_values_not_buffers() {
    let mut unit = ExecutionUnit::new();
    let source = Container::vector(vec![1i64, 2, 3]);
    let mut out = Container::vector(vec![0i64; 3]);
    unit.mov(DataType::Int64, &mut out, &source).unwrap();
    assert_eq!(out.to_vec::<i64>(), Some(vec![1, 2, 3]));

    source.set(0, 100i64).unwrap();
    assert_eq!(out.get::<i64>(0), Some(1));
    assert!(!out.shares_buffer_with(&source));
}

#[test]
fn mov_size_must_match() {
    let mut unit = ExecutionUnit::new();
    let mut out = Container::vector(vec![0i64; 2]);
    let err = unit
        .mov(DataType::Int64, &mut out, &Container::vector(vec![1i64, 2, 3]))
        .unwrap_err();
    assert_eq!(err, VmError::SizeMismatch { expected: 2, found: 3 });
}

#[test]
fn fill_broadcasts_scalar() {
    let mut unit = ExecutionUnit::new();
    let mut out = Container::vector(vec![-1i64, -1, -1]);
    unit.fill(DataType::Int64, &mut out, &Container::vector(vec![2i64]))
        .unwrap();
    assert_eq!(out.to_vec::<i64>(), Some(vec![2, 2, 2]));
}

#[test]
fn fill_allocates_unallocated_output() {
    let mut unit = ExecutionUnit::new();
    let mut out = Container::new();
    unit.fill(DataType::String, &mut out, &Container::scalar("x".to_string()))
        .unwrap();
    assert_eq!(out.rank(), 0);
    assert_eq!(out.get::<String>(0), Some("x".to_string()));
}

#[test]
fn ref_binds_whole_container() {
    let mut unit = ExecutionUnit::new();
    let source = Container::from_values(vec![1.0f64, 2.0, 3.0, 4.0], vec![2, 2]).unwrap();
    let mut out = Container::new();
    unit.reference(DataType::Float64, &mut out, &source).unwrap();
    assert_eq!(out.binding(), Binding::View);
    assert_eq!(out.shape(), &[2, 2]);

    out.set(3, 40.0f64).unwrap();
    assert_eq!(source.get::<f64>(3), Some(40.0));
}

#[test]
fn free_releases_the_buffer() {
    let mut unit = ExecutionUnit::new();
    let mut out = Container::vector(vec![1i64, 2]);
    let keep = out.clone();
    unit.free(&mut out);
    assert_eq!(out.data_type(), DataType::Void);
    assert_eq!(keep.to_vec::<i64>(), Some(vec![1, 2]));
    assert_eq!(std::rc::Rc::strong_count(keep.buffer().unwrap()), 1);
}

#[test]
fn vec_packs_scalars() {
    let mut unit = ExecutionUnit::new();
    let mut out = Container::new();
    let inputs = [
        Container::scalar(4i64),
        Container::scalar(5i64),
        Container::scalar(6i64),
    ];
    unit.vec(DataType::Int64, &mut out, &inputs).unwrap();
    assert_eq!(out.shape(), &[3]);
    assert_eq!(out.to_vec::<i64>(), Some(vec![4, 5, 6]));

    inputs[0].set(0, 0i64).unwrap();
    assert_eq!(out.get::<i64>(0), Some(4));

    let before = out.buffer().unwrap().clone();
    unit.vec(DataType::Int64, &mut out, &inputs).unwrap();
    assert!(std::rc::Rc::ptr_eq(&before, out.buffer().unwrap()));
    assert_eq!(out.to_vec::<i64>(), Some(vec![0, 5, 6]));
}

#[test]
fn vec_rejects_array_inputs() {
    let mut unit = ExecutionUnit::new();
    let mut out = Container::new();
    let err = unit
        .vec(DataType::Int64, &mut out, &[Container::vector(vec![1i64, 2])])
        .unwrap_err();
    assert_eq!(err, VmError::SizeMismatch { expected: 1, found: 2 });
}
