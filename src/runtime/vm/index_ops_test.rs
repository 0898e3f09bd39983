use crate::{
    bytecode::data_type::DataType,
    runtime::{
        container::{Binding, Container},
        error::VmError,
        vm::ExecutionUnit,
    },
};

fn cube() -> Container {
    Container::from_values((0..24).collect::<Vec<i64>>(), vec![2, 3, 4]).unwrap()
}

#[test]
fn elem_is_row_major() {
    let mut unit = ExecutionUnit::new();
    let source = cube();
    let mut out = Container::new();
    unit.elem(
        DataType::Int64,
        &mut out,
        &source,
        &[Container::vector(vec![1i64, 0, 2])],
    )
    .unwrap();
    assert_eq!(out.rank(), 0);
    assert_eq!(out.binding(), Binding::View);
    assert_eq!(out.get::<i64>(0), Some(14));
}

#[test]
fn writes_through_elem_reach_the_source() {
    let mut unit = ExecutionUnit::new();
    let source = cube();
    let mut out = Container::new();
    unit.elem(
        DataType::Int64,
        &mut out,
        &source,
        &[
            Container::scalar(1i64),
            Container::scalar(0i64),
            Container::scalar(2i64),
        ],
    )
    .unwrap();

    unit.fill(DataType::Int64, &mut out, &Container::scalar(-5i64))
        .unwrap();
    assert_eq!(source.get::<i64>(14), Some(-5));
    assert_eq!(source.get::<i64>(13), Some(13));
}

#[test]
fn elem_of_offset_view_adds_offsets() {
    let mut unit = ExecutionUnit::new();
    let base = Container::vector((0..10).collect::<Vec<i64>>());
    let mut window = Container::new();
    window.bind_view(base.buffer().unwrap(), 4, vec![2, 3]);

    let mut out = Container::new();
    unit.elem(
        DataType::Int64,
        &mut out,
        &window,
        &[Container::vector(vec![1i64, 1])],
    )
    .unwrap();
    assert_eq!(out.offset(), 8);
    assert_eq!(out.get::<i64>(0), Some(8));
}

#[test]
fn out_of_range_index_is_rejected() {
    let mut unit = ExecutionUnit::new();
    let mut out = Container::new();
    let err = unit
        .elem(
            DataType::Int64,
            &mut out,
            &cube(),
            &[Container::vector(vec![0i64, 3, 0])],
        )
        .unwrap_err();
    assert_eq!(
        err,
        VmError::InvalidArrayIndex {
            axis: 1,
            index: 3,
            length: 3
        }
    );

    let err = unit
        .elem(
            DataType::Int64,
            &mut out,
            &cube(),
            &[Container::vector(vec![-1i64, 0, 0])],
        )
        .unwrap_err();
    assert!(matches!(err, VmError::InvalidArrayIndex { index: -1, .. }));
}

#[test]
fn subscript_count_must_match_rank() {
    let mut unit = ExecutionUnit::new();
    let mut out = Container::new();
    let err = unit
        .elem(
            DataType::Int64,
            &mut out,
            &cube(),
            &[Container::vector(vec![0i64, 0])],
        )
        .unwrap_err();
    assert_eq!(err, VmError::InvalidSubscriptRank { rank: 3, found: 2 });
}

#[test]
fn movelm_copies_one_element() {
    let mut unit = ExecutionUnit::new();
    let source = cube();
    let mut out = Container::new();
    unit.movelm(
        DataType::Int64,
        &mut out,
        &source,
        &[Container::vector(vec![1i64, 2, 3])],
    )
    .unwrap();
    assert_eq!(out.get::<i64>(0), Some(23));
    assert!(!out.shares_buffer_with(&source));
}

#[test]
fn len_per_axis() {
    let mut unit = ExecutionUnit::new();
    let source = cube();
    let mut out = Container::new();

    unit.len(DataType::Int64, &mut out, &source, None).unwrap();
    assert_eq!(out.get::<i64>(0), Some(2));

    unit.len(DataType::Int64, &mut out, &source, Some(&Container::scalar(2i64)))
        .unwrap();
    assert_eq!(out.get::<i64>(0), Some(4));

    unit.len(DataType::Int64, &mut out, &Container::scalar(1.0f64), None)
        .unwrap();
    assert_eq!(out.get::<i64>(0), Some(1));

    let err = unit
        .len(DataType::Int64, &mut out, &source, Some(&Container::scalar(3i64)))
        .unwrap_err();
    assert!(matches!(err, VmError::InvalidArrayIndex { .. }));
}
