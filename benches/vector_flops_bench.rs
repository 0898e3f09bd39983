use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use vecscript::bytecode::data_type::DataType;
use vecscript::bytecode::instruction::{Operand, make};
use vecscript::bytecode::object_code::{GlobalSlot, ObjectCode};
use vecscript::bytecode::op_code::OpCode;
use vecscript::runtime::config::VmConfig;
use vecscript::runtime::container::Container;
use vecscript::runtime::host::{FunctionTable, VariableTable};
use vecscript::runtime::virtual_machine::VirtualMachine;

/// y = a * x + y over FLOAT64 vectors of one length.
fn build_saxpy() -> ObjectCode {
    ObjectCode {
        instructions: vec![
            make(OpCode::OpAllocr, DataType::Float64, &[Operand::register(0), Operand::global(1)]),
            make(OpCode::OpFill, DataType::Float64, &[Operand::register(0), Operand::global(0)]),
            make(
                OpCode::OpMul,
                DataType::Float64,
                &[Operand::register(0), Operand::register(0), Operand::global(1)],
            ),
            make(
                OpCode::OpAdd,
                DataType::Float64,
                &[Operand::global(2), Operand::global(2), Operand::register(0)],
            ),
        ],
        registers: 1,
        globals: vec![
            GlobalSlot {
                name: "a".to_string(),
                address: 0,
            },
            GlobalSlot {
                name: "x".to_string(),
                address: 1,
            },
            GlobalSlot {
                name: "y".to_string(),
                address: 2,
            },
        ],
        referenced_globals: [2].into_iter().collect(),
        ..Default::default()
    }
}

fn saxpy_variables(len: usize) -> VariableTable {
    let mut variables = VariableTable::new();
    variables.register("a", Container::scalar(1.0001f64), true);
    variables.register(
        "x",
        Container::vector((0..len).map(|i| i as f64).collect::<Vec<_>>()),
        true,
    );
    variables.register("y", Container::vector(vec![0.0f64; len]), false);
    variables
}

fn bench_vector_flops(c: &mut Criterion) {
    let object_code = build_saxpy();
    let mut group = c.benchmark_group("vm/vector_flops");

    for len in [1_000usize, 100_000, 1_000_000] {
        group.throughput(Throughput::Elements(2 * len as u64));
        group.bench_with_input(BenchmarkId::new("saxpy", len), &len, |b, &len| {
            let mut vm = VirtualMachine::new(VmConfig::default());
            let mut variables = saxpy_variables(len);
            let mut functions = FunctionTable::new();
            vm.execute(&object_code, &mut variables, &mut functions)
                .unwrap();
            b.iter(|| {
                vm.reexecute_last(black_box(&mut variables), &mut functions)
                    .unwrap();
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_vector_flops);
criterion_main!(benches);
