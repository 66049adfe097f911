//! Bytecode to native code.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use cranelift_codegen::ir::{
    self, AbiParam, FuncRef, InstBuilder, TrapCode, UserFuncName, types,
};
use cranelift_codegen::isa::TargetIsa;
use cranelift_codegen::verify_function;
use cranelift_frontend::{FunctionBuilder, FunctionBuilderContext};
use cranelift_module::{FuncId, Linkage, Module, default_libcall_names};
use cranelift_object::{ObjectBuilder, ObjectModule};
use tracing::{debug, trace, warn};

use crate::bytecode::{Address, BytecodeChunk, BytecodeExecutable, Instruction};
use crate::codegen::stack::OperandStack;
use crate::codegen::target::resolve_isa;
use crate::codegen::{CodegenError, CompileOptions};

/// Symbol name of the function compiled from chunk `index`.
pub fn function_name(index: usize) -> String {
    format!("fn{}", index)
}

/// Functions the generated code calls into, provided by the runtime at link time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeFunction {
    PrintLong,
    PrintChar,
}

impl RuntimeFunction {
    pub fn symbol(self) -> &'static str {
        match self {
            RuntimeFunction::PrintLong => "ferrule_print_long",
            RuntimeFunction::PrintChar => "ferrule_print_char",
        }
    }

    fn slot(self) -> usize {
        match self {
            RuntimeFunction::PrintLong => 0,
            RuntimeFunction::PrintChar => 1,
        }
    }
}

/// A compiled function kept for inspection when `retain_ir` is set.
#[derive(Debug, Clone)]
pub struct EmittedFunction {
    pub name: String,
    pub address: Address,
    /// IR as built, before backend compilation.
    pub ir: ir::Function,
    /// Operand stack left at the terminator, bottom-first.
    pub residual: Vec<ir::Value>,
    pub max_stack_depth: usize,
}

/// Compiles one [`BytecodeExecutable`] into one object file.
///
/// Compilation runs in phases: [`declare_functions`](Self::declare_functions)
/// creates a symbol for every chunk, [`define_functions`](Self::define_functions)
/// emits and verifies every body, and [`write_object`](Self::write_object)
/// serializes the module. All symbols exist before any body is emitted so a
/// body can refer to any other function.
pub struct NativeCompiler<'a> {
    executable: &'a BytecodeExecutable,
    module: ObjectModule,
    builder_context: FunctionBuilderContext,
    functions: Vec<FuncId>,
    /// Runtime imports, declared on first use.
    runtime: [Option<FuncId>; 2],
    retain_ir: bool,
    emitted: Vec<EmittedFunction>,
}

impl<'a> NativeCompiler<'a> {
    /// Resolve the target and set up an empty object module.
    pub fn new(
        executable: &'a BytecodeExecutable,
        options: &CompileOptions,
    ) -> Result<Self, CodegenError> {
        let isa = resolve_isa(&options.target)?;
        let builder = ObjectBuilder::new(isa, options.module_name.as_str(), default_libcall_names())
            .map_err(|err| CodegenError::Emission {
                message: err.to_string(),
            })?;

        Ok(Self {
            executable,
            module: ObjectModule::new(builder),
            builder_context: FunctionBuilderContext::new(),
            functions: Vec::new(),
            runtime: [None; 2],
            retain_ir: options.retain_ir,
            emitted: Vec::new(),
        })
    }

    /// Declare and define every function.
    pub fn generate(&mut self) -> Result<(), CodegenError> {
        self.declare_functions()?;
        self.define_functions()
    }

    /// Declare one exported `fn() -> ()` per chunk. Calling this again is a no-op.
    pub fn declare_functions(&mut self) -> Result<(), CodegenError> {
        if !self.functions.is_empty() {
            debug!("functions already declared");
            return Ok(());
        }

        let signature = self.module.make_signature();
        for index in 0..self.executable.chunks.len() {
            let name = function_name(index);
            let id = self
                .module
                .declare_function(&name, Linkage::Export, &signature)?;
            debug!(%name, "declared function");
            self.functions.push(id);
        }
        Ok(())
    }

    /// Emit the body of every declared function.
    pub fn define_functions(&mut self) -> Result<(), CodegenError> {
        let executable = self.executable;
        if self.functions.len() != executable.chunks.len() {
            return Err(CodegenError::NotDeclared {
                declared: self.functions.len(),
                chunks: executable.chunks.len(),
            });
        }

        for (index, (chunk, address)) in executable.chunks.iter().enumerate() {
            self.emit_function(index, chunk, *address)?;
        }
        Ok(())
    }

    fn emit_function(
        &mut self,
        index: usize,
        chunk: &BytecodeChunk,
        address: Address,
    ) -> Result<(), CodegenError> {
        let name = function_name(index);
        let id = self.functions[index];

        let mut ctx = self.module.make_context();
        ctx.func.signature = self.module.make_signature();
        ctx.func.name = UserFuncName::user(0, id.as_u32());

        let mut builder = FunctionBuilder::new(&mut ctx.func, &mut self.builder_context);
        let entry = builder.create_block();
        builder.switch_to_block(entry);
        builder.seal_block(entry);

        let mut stack = OperandStack::new();
        let mut imports: [Option<FuncRef>; 2] = [None; 2];
        let mut terminated = false;

        for (offset, instruction) in chunk.code.iter().enumerate() {
            trace!(function = %name, offset, %instruction, "lowering instruction");

            let available = stack.len();
            let underflow = || CodegenError::StackUnderflow {
                function: name.clone(),
                offset,
                instruction: *instruction,
                needed: instruction.stack_effect().pops,
                available,
            };

            match *instruction {
                Instruction::Nop => {}
                Instruction::Return => {
                    builder.ins().return_(&[]);
                }
                Instruction::Trap => {
                    builder.ins().trap(TrapCode::User(0));
                }
                Instruction::Breakpoint => {
                    builder.ins().debugtrap();
                }
                Instruction::ImmByte(value) => {
                    let value = builder.ins().iconst(types::I64, i64::from(value));
                    stack.push(value);
                }
                Instruction::Dup => stack.dup().ok_or_else(underflow)?,
                Instruction::Rot2 => stack.rotate(2).ok_or_else(underflow)?,
                Instruction::Rot3 => stack.rotate(3).ok_or_else(underflow)?,
                Instruction::AddLong => {
                    let [a, b] = stack.pop_n::<2>().ok_or_else(underflow)?;
                    let sum = builder.ins().iadd(a, b);
                    stack.push(sum);
                }
                Instruction::MulLong => {
                    let [a, b] = stack.pop_n::<2>().ok_or_else(underflow)?;
                    let product = builder.ins().imul(a, b);
                    stack.push(product);
                }
                Instruction::PrintLong | Instruction::PrintChar => {
                    let [value] = stack.pop_n::<1>().ok_or_else(underflow)?;
                    let runtime = if *instruction == Instruction::PrintLong {
                        RuntimeFunction::PrintLong
                    } else {
                        RuntimeFunction::PrintChar
                    };
                    let callee = match imports[runtime.slot()] {
                        Some(callee) => callee,
                        None => {
                            let func_id =
                                declare_runtime(&mut self.module, &mut self.runtime, runtime)?;
                            let callee = self.module.declare_func_in_func(func_id, builder.func);
                            imports[runtime.slot()] = Some(callee);
                            callee
                        }
                    };
                    builder.ins().call(callee, &[value]);
                }
            }

            if instruction.is_terminator() {
                let skipped = chunk.code.len() - offset - 1;
                if skipped > 0 {
                    warn!(function = %name, offset, skipped, "dropping unreachable instructions after terminator");
                }
                terminated = true;
                break;
            }
        }

        if !terminated {
            return Err(CodegenError::MissingTerminator { function: name });
        }

        let max_stack_depth = stack.max_depth();
        let residual = stack.into_vec();
        builder.finalize();

        verify(&ctx.func, self.module.isa(), &name)?;

        let ir = self.retain_ir.then(|| ctx.func.clone());
        self.module.define_function(id, &mut ctx)?;
        debug!(%name, address = address.0, max_stack_depth, "defined function");

        if let Some(ir) = ir {
            self.emitted.push(EmittedFunction {
                name,
                address,
                ir,
                residual,
                max_stack_depth,
            });
        }
        Ok(())
    }

    /// Ids of the declared functions, in chunk order.
    pub fn declared(&self) -> &[FuncId] {
        &self.functions
    }

    /// Functions retained when `retain_ir` is set, in definition order.
    pub fn emitted(&self) -> &[EmittedFunction] {
        &self.emitted
    }

    /// Serialize the module into object file bytes.
    pub fn finish(self) -> Result<Vec<u8>, CodegenError> {
        let product = self.module.finish();
        product.emit().map_err(|err| CodegenError::Emission {
            message: err.to_string(),
        })
    }

    /// Serialize the module and write it to `path`.
    ///
    /// The file is only created once the object has been fully emitted, and is
    /// removed again if writing fails part-way.
    pub fn write_object(self, path: &Path) -> Result<(), CodegenError> {
        let bytes = self.finish()?;
        write_output(path, &bytes)?;
        debug!(path = %path.display(), bytes = bytes.len(), "wrote object file");
        Ok(())
    }
}

/// Run the IR verifier. Bytecode that lowers without error must verify, so a
/// failure here is a compiler bug.
pub(crate) fn verify(
    func: &ir::Function,
    isa: &dyn TargetIsa,
    function: &str,
) -> Result<(), CodegenError> {
    verify_function(func, isa).map_err(|errors| CodegenError::Verification {
        function: function.to_string(),
        errors: errors.to_string(),
    })
}

fn declare_runtime(
    module: &mut ObjectModule,
    declared: &mut [Option<FuncId>; 2],
    runtime: RuntimeFunction,
) -> Result<FuncId, CodegenError> {
    if let Some(id) = declared[runtime.slot()] {
        return Ok(id);
    }
    let mut signature = module.make_signature();
    signature.params.push(AbiParam::new(types::I64));
    let id = module.declare_function(runtime.symbol(), Linkage::Import, &signature)?;
    declared[runtime.slot()] = Some(id);
    Ok(id)
}

fn write_output(path: &Path, bytes: &[u8]) -> Result<(), CodegenError> {
    let output_error = |source| CodegenError::OutputFile {
        path: path.to_path_buf(),
        source,
    };

    let mut file = File::create(path).map_err(output_error)?;
    if let Err(source) = file.write_all(bytes).and_then(|()| file.flush()) {
        drop(file);
        let _ = fs::remove_file(path);
        return Err(output_error(source));
    }
    Ok(())
}

/// Compile `executable` and write the object file to `output`.
pub fn compile(
    executable: &BytecodeExecutable,
    output: impl AsRef<Path>,
    options: &CompileOptions,
) -> Result<(), CodegenError> {
    let mut compiler = NativeCompiler::new(executable, options)?;
    compiler.generate()?;
    compiler.write_object(output.as_ref())
}
