use core::fmt;

/// Root of the tree. Statements keep their textual order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgramNode {
    pub statements: Vec<StatementNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatementNode {
    Function(FunctionNode),
    TypeDefinition(TypeDefinitionNode),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdNode {
    pub id: String,
}

impl IdNode {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl fmt::Display for IdNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionNode {
    pub id: IdNode,
    pub parameters: Vec<ParamNode>,
    pub body: Vec<InstructionNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamNode {
    pub id: IdNode,
}

/// A `type` statement. Carried through lowering but not interpreted.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDefinitionNode {
    pub id: IdNode,
    pub fields: Vec<IdNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InstructionNode {
    Binary(BinaryNode),
    // The variants below have grammar productions but no lowering yet.
    NoArg(NoArgNode),
    Arrow(ArrowNode),
    Print(PrintNode),
    Memory(MemoryNode),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoArgNode;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArrowNode;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrintNode;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryNode;

/// `op lhs, arg1, arg2`
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryNode {
    pub op: BinaryOperator,
    pub lhs: LValueNode,
    pub arg1: ArgNode,
    pub arg2: ArgNode,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Mul,
}

impl BinaryOperator {
    /// Keyword used for this operator in source text.
    pub fn keyword(self) -> &'static str {
        match self {
            BinaryOperator::Add => "add",
            BinaryOperator::Mul => "mul",
        }
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Destination operand of an instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LValueNode {
    pub name: String,
}

/// Named source operand of an instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RValueNode {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ArgNode {
    RValue(RValueNode),
    Immediate(ImmediateNode),
}

/// A numeric literal. Literals written with a decimal point are floats.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ImmediateNode {
    Int(i64),
    Float(f64),
}

impl ImmediateNode {
    pub fn is_float(&self) -> bool {
        matches!(self, ImmediateNode::Float(_))
    }
}

/// Renders the literal the way it would be written in source.
///
/// Floats always keep a decimal point so the text lowers back to a float.
impl fmt::Display for ImmediateNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImmediateNode::Int(value) => write!(f, "{}", value),
            ImmediateNode::Float(value) if value.fract() == 0.0 && value.is_finite() => {
                write!(f, "{:.1}", value)
            }
            ImmediateNode::Float(value) => write!(f, "{}", value),
        }
    }
}
