use ferrule::ast::*;
use once_cell::sync::Lazy;

pub struct TestCase {
    pub name: &'static str,
    pub source: &'static str,
    pub ast: ProgramNode,
}

fn lvalue(name: &str) -> LValueNode {
    LValueNode {
        name: name.to_string(),
    }
}

fn rvalue(name: &str) -> ArgNode {
    ArgNode::RValue(RValueNode {
        name: name.to_string(),
    })
}

fn binary(op: BinaryOperator, lhs: &str, arg1: ArgNode, arg2: ArgNode) -> InstructionNode {
    InstructionNode::Binary(BinaryNode {
        op,
        lhs: lvalue(lhs),
        arg1,
        arg2,
    })
}

fn function(name: &str, parameters: &[&str], body: Vec<InstructionNode>) -> StatementNode {
    StatementNode::Function(FunctionNode {
        id: IdNode::new(name),
        parameters: parameters
            .iter()
            .map(|p| ParamNode { id: IdNode::new(*p) })
            .collect(),
        body,
    })
}

pub static TEST_CASES: Lazy<Vec<TestCase>> = Lazy::new(|| {
    vec![
        TestCase {
            name: "single_multiply",
            source: "function f: mul x, 2, 3",
            ast: ProgramNode {
                statements: vec![function(
                    "f",
                    &[],
                    vec![binary(
                        BinaryOperator::Mul,
                        "x",
                        ArgNode::Immediate(ImmediateNode::Int(2)),
                        ArgNode::Immediate(ImmediateNode::Int(3)),
                    )],
                )],
            },
        },
        TestCase {
            name: "parameters_and_registers",
            source: "function scale(v, k):\n    mul t, v, k\n    add t, t, 0.5\n",
            ast: ProgramNode {
                statements: vec![function(
                    "scale",
                    &["v", "k"],
                    vec![
                        binary(BinaryOperator::Mul, "t", rvalue("v"), rvalue("k")),
                        binary(
                            BinaryOperator::Add,
                            "t",
                            rvalue("t"),
                            ArgNode::Immediate(ImmediateNode::Float(0.5)),
                        ),
                    ],
                )],
            },
        },
        TestCase {
            name: "type_then_function",
            source: "# a point\ntype point { x, y }\nfunction origin: add x, 0, -1",
            ast: ProgramNode {
                statements: vec![
                    StatementNode::TypeDefinition(TypeDefinitionNode {
                        id: IdNode::new("point"),
                        fields: vec![IdNode::new("x"), IdNode::new("y")],
                    }),
                    function(
                        "origin",
                        &[],
                        vec![binary(
                            BinaryOperator::Add,
                            "x",
                            ArgNode::Immediate(ImmediateNode::Int(0)),
                            ArgNode::Immediate(ImmediateNode::Int(-1)),
                        )],
                    ),
                ],
            },
        },
        TestCase {
            name: "empty_program",
            source: "  # nothing here\n",
            ast: ProgramNode::default(),
        },
    ]
});
