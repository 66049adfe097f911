use cranelift_codegen::cursor::{Cursor, FuncCursor};
use cranelift_codegen::ir::{self, InstBuilder, InstructionData, Opcode, UserFuncName, ValueDef, types};
use pretty_assertions::assert_eq;

use crate::bytecode::{Address, BytecodeChunk, BytecodeExecutable, Instruction};
use crate::codegen::native::verify;
use crate::codegen::target::resolve_isa;
use crate::codegen::{CodegenError, CompileOptions, ErrorClass, NativeCompiler, Target, compile};
use crate::test_utils::init_test_logging;

use Instruction::*;

fn executable(chunks: Vec<Vec<Instruction>>) -> BytecodeExecutable {
    chunks.into_iter().map(BytecodeChunk::new).collect()
}

fn retaining() -> CompileOptions {
    CompileOptions {
        retain_ir: true,
        ..CompileOptions::default()
    }
}

fn generate(code: Vec<Instruction>) -> Result<NativeCompiler<'static>, CodegenError> {
    let executable = Box::leak(Box::new(executable(vec![code])));
    let mut compiler = NativeCompiler::new(executable, &retaining())?;
    compiler.generate()?;
    Ok(compiler)
}

/// Evaluate a constant value by walking its definition in the data-flow graph.
fn evaluate(func: &ir::Function, value: ir::Value) -> i64 {
    let value = func.dfg.resolve_aliases(value);
    let ValueDef::Result(inst, _) = func.dfg.value_def(value) else {
        panic!("{} is not an instruction result", value);
    };
    match func.dfg.insts[inst] {
        InstructionData::UnaryImm {
            opcode: Opcode::Iconst,
            imm,
        } => imm.bits(),
        InstructionData::Binary {
            opcode: Opcode::Iadd,
            args: [a, b],
        } => evaluate(func, a).wrapping_add(evaluate(func, b)),
        InstructionData::Binary {
            opcode: Opcode::Imul,
            args: [a, b],
        } => evaluate(func, a).wrapping_mul(evaluate(func, b)),
        ref other => panic!("unexpected instruction {:?}", other),
    }
}

/// Reference stack machine for the pure instructions, run up to the terminator.
fn interpret(code: &[Instruction]) -> Vec<i64> {
    let mut stack: Vec<i64> = Vec::new();
    for instruction in code {
        match *instruction {
            ImmByte(n) => stack.push(i64::from(n)),
            Dup => {
                let top = *stack.last().unwrap();
                stack.push(top);
            }
            Rot2 => {
                let len = stack.len();
                stack.swap(len - 1, len - 2);
            }
            Rot3 => {
                let len = stack.len();
                stack[len - 3..].rotate_left(1);
            }
            AddLong => {
                let b = stack.pop().unwrap();
                let a = stack.pop().unwrap();
                stack.push(a.wrapping_add(b));
            }
            MulLong => {
                let b = stack.pop().unwrap();
                let a = stack.pop().unwrap();
                stack.push(a.wrapping_mul(b));
            }
            Nop | Breakpoint => {}
            Return | Trap => break,
            PrintLong | PrintChar => {
                stack.pop().unwrap();
            }
        }
    }
    stack
}

fn residual_constants(compiler: &NativeCompiler<'_>) -> Vec<i64> {
    let emitted = &compiler.emitted()[0];
    emitted
        .residual
        .iter()
        .map(|value| evaluate(&emitted.ir, *value))
        .collect()
}

fn count_opcode(func: &ir::Function, opcode: Opcode) -> usize {
    func.layout
        .blocks()
        .flat_map(|block| func.layout.block_insts(block))
        .filter(|inst| func.dfg.insts[*inst].opcode() == opcode)
        .count()
}

#[test]
fn test_add_two_constants() {
    init_test_logging();
    let compiler = generate(vec![ImmByte(0), ImmByte(0), AddLong, Return]).unwrap();

    let emitted = compiler.emitted();
    assert_eq!(emitted.len(), 1);
    assert_eq!(emitted[0].name, "fn0");
    assert_eq!(emitted[0].address, Address(0));
    assert_eq!(emitted[0].max_stack_depth, 2);
    assert_eq!(count_opcode(&emitted[0].ir, Opcode::Iadd), 1);
    assert_eq!(count_opcode(&emitted[0].ir, Opcode::Return), 1);
    assert_eq!(residual_constants(&compiler), vec![0]);
}

#[test]
fn test_lowering_matches_stack_machine() {
    let programs = vec![
        vec![ImmByte(2), ImmByte(3), MulLong, ImmByte(4), AddLong, Return],
        vec![ImmByte(7), Dup, MulLong, Return],
        vec![ImmByte(1), ImmByte(2), Rot2, Return],
        vec![ImmByte(1), ImmByte(2), ImmByte(3), Rot3, Return],
        vec![ImmByte(-128), ImmByte(127), AddLong, ImmByte(-1), MulLong, Return],
        vec![ImmByte(5), ImmByte(6), Nop, Breakpoint, Rot2, Dup, AddLong, Return],
    ];

    for code in programs {
        let expected = interpret(&code);
        let compiler = generate(code.clone()).unwrap();
        assert_eq!(residual_constants(&compiler), expected, "program {:?}", code);
    }
}

#[test]
fn test_immediate_is_sign_extended() {
    let compiler = generate(vec![ImmByte(-1), Return]).unwrap();
    assert_eq!(residual_constants(&compiler), vec![-1]);
}

#[test]
fn test_underflow_is_an_input_error() {
    for code in [vec![AddLong, Return], vec![ImmByte(1), AddLong, Return]] {
        let available = code.len() - 2;
        let err = generate(code).err().unwrap();
        match &err {
            CodegenError::StackUnderflow {
                function,
                offset,
                instruction,
                needed,
                available: found,
            } => {
                assert_eq!(function, "fn0");
                assert_eq!(*offset, available);
                assert_eq!(*instruction, AddLong);
                assert_eq!(*needed, 2);
                assert_eq!(*found, available);
            }
            other => panic!("expected StackUnderflow, got {:?}", other),
        }
        assert_eq!(err.class(), ErrorClass::Input);
    }
}

#[test]
fn test_rotate_and_dup_underflow() {
    let err = generate(vec![ImmByte(1), ImmByte(2), Rot3, Return]).err().unwrap();
    assert!(
        matches!(err, CodegenError::StackUnderflow { needed: 3, available: 2, .. }),
        "{:?}",
        err
    );

    let err = generate(vec![Dup, Return]).err().unwrap();
    assert!(
        matches!(err, CodegenError::StackUnderflow { needed: 1, available: 0, .. }),
        "{:?}",
        err
    );
}

#[test]
fn test_missing_terminator() {
    let err = generate(vec![ImmByte(1), ImmByte(2), AddLong]).err().unwrap();
    assert!(
        matches!(&err, CodegenError::MissingTerminator { function } if function == "fn0"),
        "{:?}",
        err
    );
    assert!(!err.is_internal());

    let err = generate(vec![]).err().unwrap();
    assert!(matches!(err, CodegenError::MissingTerminator { .. }), "{:?}", err);
}

#[test]
fn test_instructions_after_terminator_are_dropped() {
    init_test_logging();
    // The trailing AddLong would underflow if it were lowered.
    let compiler = generate(vec![ImmByte(3), Return, AddLong, AddLong]).unwrap();
    let emitted = &compiler.emitted()[0];
    assert_eq!(count_opcode(&emitted.ir, Opcode::Iadd), 0);
    assert_eq!(residual_constants(&compiler), vec![3]);
}

#[test]
fn test_trap_terminates() {
    let compiler = generate(vec![Breakpoint, Trap]).unwrap();
    let ir = &compiler.emitted()[0].ir;
    assert_eq!(count_opcode(ir, Opcode::Trap), 1);
    assert_eq!(count_opcode(ir, Opcode::Debugtrap), 1);
    assert_eq!(count_opcode(ir, Opcode::Return), 0);
}

#[test]
fn test_print_calls_runtime() {
    let compiler = generate(vec![
        ImmByte(42),
        PrintLong,
        ImmByte(10),
        PrintChar,
        ImmByte(1),
        PrintLong,
        Return,
    ])
    .unwrap();
    let emitted = &compiler.emitted()[0];
    assert_eq!(count_opcode(&emitted.ir, Opcode::Call), 3);
    // One import per runtime function, shared by every call site.
    assert_eq!(emitted.ir.dfg.ext_funcs.len(), 2);
    assert!(emitted.residual.is_empty());

    let err = generate(vec![PrintChar, Return]).err().unwrap();
    assert!(
        matches!(err, CodegenError::StackUnderflow { needed: 1, .. }),
        "{:?}",
        err
    );
}

#[test]
fn test_declare_functions_is_idempotent() {
    let executable = executable(vec![vec![Return], vec![Return], vec![Return]]);
    let mut compiler = NativeCompiler::new(&executable, &CompileOptions::default()).unwrap();
    compiler.declare_functions().unwrap();
    let first = compiler.declared().to_vec();
    compiler.declare_functions().unwrap();
    assert_eq!(compiler.declared(), first.as_slice());
    assert_eq!(first.len(), 3);
}

#[test]
fn test_define_before_declare_is_internal() {
    let executable = executable(vec![vec![Return]]);
    let mut compiler = NativeCompiler::new(&executable, &CompileOptions::default()).unwrap();
    let err = compiler.define_functions().unwrap_err();
    assert!(
        matches!(err, CodegenError::NotDeclared { declared: 0, chunks: 1 }),
        "{:?}",
        err
    );
    assert!(err.is_internal());
}

#[test]
fn test_ir_not_retained_by_default() {
    let executable = executable(vec![vec![Return]]);
    let mut compiler = NativeCompiler::new(&executable, &CompileOptions::default()).unwrap();
    compiler.generate().unwrap();
    assert!(compiler.emitted().is_empty());
}

#[test]
fn test_object_exports_every_function() {
    let executable = executable(vec![
        vec![ImmByte(1), ImmByte(2), AddLong, Return],
        vec![ImmByte(3), PrintLong, Return],
    ]);
    let mut compiler = NativeCompiler::new(&executable, &CompileOptions::default()).unwrap();
    compiler.generate().unwrap();
    let bytes = compiler.finish().unwrap();

    let contains = |needle: &[u8]| bytes.windows(needle.len()).any(|w| w == needle);
    assert!(contains(b"fn0"));
    assert!(contains(b"fn1"));
    assert!(contains(b"ferrule_print_long"));
}

#[test]
fn test_empty_executable_writes_object() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.o");
    compile(&BytecodeExecutable::new(), &path, &CompileOptions::default()).unwrap();
    assert!(path.exists());
}

#[test]
fn test_unsupported_target_creates_no_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.o");
    let options = CompileOptions {
        target: Target::Triple("bogus-unknown-triple".to_string()),
        ..CompileOptions::default()
    };
    let err = compile(&executable(vec![vec![Return]]), &path, &options).unwrap_err();
    assert!(
        matches!(&err, CodegenError::UnsupportedTarget { triple, .. } if triple == "bogus-unknown-triple"),
        "{:?}",
        err
    );
    assert_eq!(err.class(), ErrorClass::Input);
    assert!(!path.exists());
}

#[test]
fn test_failed_lowering_creates_no_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.o");
    let err = compile(
        &executable(vec![vec![Return], vec![MulLong, Return]]),
        &path,
        &CompileOptions::default(),
    )
    .unwrap_err();
    assert!(
        matches!(&err, CodegenError::StackUnderflow { function, .. } if function == "fn1"),
        "{:?}",
        err
    );
    assert!(!path.exists());
}

#[test]
fn test_unwritable_output_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("out.o");
    let err = compile(
        &executable(vec![vec![Return]]),
        &path,
        &CompileOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, CodegenError::OutputFile { .. }), "{:?}", err);
    assert_eq!(err.class(), ErrorClass::Input);
}

#[test]
fn test_unknown_architecture_creates_no_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.o");
    let options = CompileOptions {
        target: Target::Triple("riscv64gc-unknown-linux-gnu".to_string()),
        ..CompileOptions::default()
    };
    let err = compile(&executable(vec![vec![Return]]), &path, &options).unwrap_err();
    assert!(
        matches!(&err, CodegenError::UnsupportedTarget { triple, .. } if triple == "riscv64gc-unknown-linux-gnu"),
        "{:?}",
        err
    );
    assert_eq!(err.class(), ErrorClass::Input);
    assert!(!path.exists());
}

#[test]
fn test_malformed_triple_is_reported() {
    for triple in ["", "not a triple at all", "bogus-unknown-triple"] {
        let options = CompileOptions {
            target: Target::Triple(triple.to_string()),
            ..CompileOptions::default()
        };
        let executable = executable(vec![vec![Return]]);
        let err = NativeCompiler::new(&executable, &options).err().unwrap();
        assert!(
            matches!(err, CodegenError::UnsupportedTarget { .. }),
            "triple {:?}: {:?}",
            triple,
            err
        );
    }
}

#[test]
fn test_verifier_rejection_is_internal() {
    let isa = resolve_isa(&Target::Host).unwrap();
    let mut func = ir::Function::with_name_signature(
        UserFuncName::user(0, 0),
        ir::Signature::new(isa.default_call_conv()),
    );
    // A block that falls off its end without a terminator.
    let block = func.dfg.make_block();
    let mut pos = FuncCursor::new(&mut func);
    pos.insert_block(block);
    pos.ins().iconst(types::I64, 1);

    let err = verify(&func, &*isa, "broken").unwrap_err();
    match &err {
        CodegenError::Verification { function, errors } => {
            assert_eq!(function, "broken");
            assert!(!errors.is_empty());
        }
        other => panic!("expected Verification, got {:?}", other),
    }
    assert_eq!(err.class(), ErrorClass::Internal);
    assert!(err.to_string().starts_with("internal error: broken failed verification"));
}

#[test]
fn test_lowered_function_passes_verifier() {
    let isa = resolve_isa(&Target::Host).unwrap();
    let compiler = generate(vec![ImmByte(4), ImmByte(5), Rot2, MulLong, PrintLong, Return]).unwrap();
    verify(&compiler.emitted()[0].ir, &*isa, "fn0").unwrap();
}
