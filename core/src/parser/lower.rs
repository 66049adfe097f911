//! Parse tree to AST lowering.
//!
//! Each `visit_*` method handles exactly one grammar production and returns the
//! concrete AST type for it. [`AstBuilder::visit`] is the dynamic entry point for
//! callers holding an arbitrary pair: it dispatches on the rule and wraps the
//! result in [`Lowered`], whose `into_*` accessors report a mismatch as a
//! [`LowerError`] instead of panicking.

use pest::iterators::Pair;
use tracing::trace;

use crate::ast::{
    ArgNode, BinaryNode, BinaryOperator, FunctionNode, IdNode, ImmediateNode, InstructionNode,
    LValueNode, ParamNode, ProgramNode, RValueNode, StatementNode, TypeDefinitionNode,
};
use crate::diagnostics::{Context, Span};
use crate::parser::Rule;
use crate::parser::error::{LowerError, LowerErrorKind};

/// Result of lowering one production, tagged by production.
#[derive(Debug, Clone, PartialEq)]
pub enum Lowered {
    Program(ProgramNode),
    Statement(StatementNode),
    FunctionDefinition(FunctionNode),
    TypeDefinition(TypeDefinitionNode),
    ParameterList(Vec<ParamNode>),
    Instructions(Vec<InstructionNode>),
    Instruction(InstructionNode),
    BinaryOperatorInstruction(BinaryNode),
    BinaryOperator(BinaryOperator),
    LValue(LValueNode),
    Argument(ArgNode),
    RValue(RValueNode),
    Number(ImmediateNode),
    Id(IdNode),
}

impl Lowered {
    /// The production this value was lowered from.
    pub fn rule(&self) -> Rule {
        match self {
            Lowered::Program(_) => Rule::program,
            Lowered::Statement(_) => Rule::statement,
            Lowered::FunctionDefinition(_) => Rule::function_definition,
            Lowered::TypeDefinition(_) => Rule::type_definition,
            Lowered::ParameterList(_) => Rule::parameter_list,
            Lowered::Instructions(_) => Rule::instructions,
            Lowered::Instruction(_) => Rule::instruction,
            Lowered::BinaryOperatorInstruction(_) => Rule::binary_operator_instruction,
            Lowered::BinaryOperator(_) => Rule::binary_operator,
            Lowered::LValue(_) => Rule::any_lvalue,
            Lowered::Argument(_) => Rule::any_argument,
            Lowered::RValue(_) => Rule::any_rvalue,
            Lowered::Number(_) => Rule::any_number,
            Lowered::Id(_) => Rule::ident,
        }
    }
}

macro_rules! lowered_accessors {
    ($($name:ident => $variant:ident($ty:ty), $rule:ident;)*) => {
        impl Lowered {
            $(
                /// Unwrap the expected variant, or report which production was found.
                pub fn $name(self, span: Span) -> Result<$ty, LowerError> {
                    match self {
                        Lowered::$variant(node) => Ok(node),
                        other => Err(LowerError::new(
                            LowerErrorKind::UnexpectedNode {
                                expected: Rule::$rule,
                                found: other.rule(),
                            },
                            span,
                        )),
                    }
                }
            )*
        }
    };
}

lowered_accessors! {
    into_program => Program(ProgramNode), program;
    into_statement => Statement(StatementNode), statement;
    into_function => FunctionDefinition(FunctionNode), function_definition;
    into_type_definition => TypeDefinition(TypeDefinitionNode), type_definition;
    into_parameters => ParameterList(Vec<ParamNode>), parameter_list;
    into_instructions => Instructions(Vec<InstructionNode>), instructions;
    into_instruction => Instruction(InstructionNode), instruction;
    into_binary => BinaryOperatorInstruction(BinaryNode), binary_operator_instruction;
    into_operator => BinaryOperator(BinaryOperator), binary_operator;
    into_lvalue => LValue(LValueNode), any_lvalue;
    into_argument => Argument(ArgNode), any_argument;
    into_rvalue => RValue(RValueNode), any_rvalue;
    into_number => Number(ImmediateNode), any_number;
    into_id => Id(IdNode), ident;
}

/// Lowers pest pairs into AST nodes.
#[derive(Debug, Default, Clone, Copy)]
pub struct AstBuilder;

impl AstBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Lower any production, dispatching on its rule.
    pub fn visit(&self, pair: Pair<'_, Rule>) -> Result<Lowered, LowerError> {
        let lowered = match pair.as_rule() {
            Rule::program => Lowered::Program(self.visit_program(pair)?),
            Rule::statement => Lowered::Statement(self.visit_statement(pair)?),
            Rule::function_definition => {
                Lowered::FunctionDefinition(self.visit_function_definition(pair)?)
            }
            Rule::type_definition => Lowered::TypeDefinition(self.visit_type_definition(pair)?),
            Rule::parameter_list => Lowered::ParameterList(self.visit_parameter_list(pair)?),
            Rule::instructions => Lowered::Instructions(self.visit_instructions(pair)?),
            Rule::instruction => Lowered::Instruction(self.visit_instruction(pair)?),
            Rule::binary_operator_instruction => {
                Lowered::BinaryOperatorInstruction(self.visit_binary_operator_instruction(pair)?)
            }
            Rule::binary_operator => Lowered::BinaryOperator(self.visit_binary_operator(pair)?),
            Rule::any_lvalue => Lowered::LValue(self.visit_any_lvalue(pair)?),
            Rule::any_argument => Lowered::Argument(self.visit_any_argument(pair)?),
            Rule::any_rvalue => Lowered::RValue(self.visit_any_rvalue(pair)?),
            Rule::any_number => Lowered::Number(self.visit_any_number(pair)?),
            Rule::ident => Lowered::Id(self.visit_ident(pair)?),
            Rule::print_instruction
            | Rule::memory_instruction
            | Rule::arrow_instruction
            | Rule::no_arg_instruction => return Err(unsupported(&pair)),
            rule => {
                return Err(LowerError::new(
                    LowerErrorKind::NotAProduction { rule },
                    pair.as_span().into(),
                ));
            }
        };
        Ok(lowered)
    }

    pub fn visit_program(&self, pair: Pair<'_, Rule>) -> Result<ProgramNode, LowerError> {
        expect_rule(&pair, Rule::program)?;
        let statements = children(pair, Rule::statement)
            .map(|statement| self.visit_statement(statement))
            .collect::<Result<Vec<_>, _>>()?;
        trace!(statements = statements.len(), "lowered program");
        Ok(ProgramNode { statements })
    }

    pub fn visit_statement(&self, pair: Pair<'_, Rule>) -> Result<StatementNode, LowerError> {
        expect_rule(&pair, Rule::statement)?;
        let inner = first_child(&pair)?;
        match inner.as_rule() {
            Rule::function_definition => Ok(StatementNode::Function(
                self.visit_function_definition(inner)?,
            )),
            Rule::type_definition => Ok(StatementNode::TypeDefinition(
                self.visit_type_definition(inner)?,
            )),
            found => Err(LowerError::new(
                LowerErrorKind::UnexpectedNode {
                    expected: Rule::function_definition,
                    found,
                },
                inner.as_span().into(),
            )),
        }
    }

    pub fn visit_function_definition(
        &self,
        pair: Pair<'_, Rule>,
    ) -> Result<FunctionNode, LowerError> {
        expect_rule(&pair, Rule::function_definition)?;
        let span = Span::from(pair.as_span());
        let id = self.visit_ident(child(&pair, Rule::ident)?)?;

        let in_function = |err: LowerError| {
            err.with_context(Context::InFunction {
                name: id.id.clone(),
                span: span.clone(),
            })
        };

        let parameters = match find_child(&pair, Rule::parameter_list) {
            Some(list) => self.visit_parameter_list(list).map_err(&in_function)?,
            None => Vec::new(),
        };
        let body = self
            .visit_instructions(child(&pair, Rule::instructions)?)
            .map_err(&in_function)?;

        trace!(function = %id, parameters = parameters.len(), instructions = body.len(), "lowered function");
        Ok(FunctionNode {
            id,
            parameters,
            body,
        })
    }

    pub fn visit_parameter_list(&self, pair: Pair<'_, Rule>) -> Result<Vec<ParamNode>, LowerError> {
        expect_rule(&pair, Rule::parameter_list)?;
        children(pair, Rule::ident)
            .map(|ident| self.visit_ident(ident).map(|id| ParamNode { id }))
            .collect()
    }

    pub fn visit_type_definition(
        &self,
        pair: Pair<'_, Rule>,
    ) -> Result<TypeDefinitionNode, LowerError> {
        expect_rule(&pair, Rule::type_definition)?;
        let span = Span::from(pair.as_span());
        let mut idents = children(pair.clone(), Rule::ident);
        let id = match idents.next() {
            Some(ident) => self.visit_ident(ident)?,
            None => return Err(missing(&pair, Rule::ident)),
        };
        let fields = idents
            .map(|ident| self.visit_ident(ident))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| {
                err.with_context(Context::InTypeDefinition {
                    name: id.id.clone(),
                    span,
                })
            })?;
        Ok(TypeDefinitionNode { id, fields })
    }

    pub fn visit_instructions(
        &self,
        pair: Pair<'_, Rule>,
    ) -> Result<Vec<InstructionNode>, LowerError> {
        expect_rule(&pair, Rule::instructions)?;
        children(pair, Rule::instruction)
            .enumerate()
            .map(|(index, instruction)| {
                let span = Span::from(instruction.as_span());
                self.visit_instruction(instruction)
                    .map_err(|err| err.with_context(Context::InInstruction { index, span }))
            })
            .collect()
    }

    /// Only the binary-operator form lowers today; every other form is reported.
    pub fn visit_instruction(&self, pair: Pair<'_, Rule>) -> Result<InstructionNode, LowerError> {
        expect_rule(&pair, Rule::instruction)?;
        let inner = first_child(&pair)?;
        match inner.as_rule() {
            Rule::binary_operator_instruction => Ok(InstructionNode::Binary(
                self.visit_binary_operator_instruction(inner)?,
            )),
            Rule::print_instruction
            | Rule::memory_instruction
            | Rule::arrow_instruction
            | Rule::no_arg_instruction => Err(unsupported(&inner)),
            found => Err(LowerError::new(
                LowerErrorKind::UnexpectedNode {
                    expected: Rule::binary_operator_instruction,
                    found,
                },
                inner.as_span().into(),
            )),
        }
    }

    pub fn visit_binary_operator_instruction(
        &self,
        pair: Pair<'_, Rule>,
    ) -> Result<BinaryNode, LowerError> {
        expect_rule(&pair, Rule::binary_operator_instruction)?;
        let mut inner = pair.clone().into_inner();
        let mut next = |rule: Rule| match inner.next() {
            Some(child) => expect_rule(&child, rule).map(|_| child),
            None => Err(missing(&pair, rule)),
        };

        let op = self.visit_binary_operator(next(Rule::binary_operator)?)?;
        let lhs = self.visit_any_lvalue(next(Rule::any_lvalue)?)?;
        let arg1 = self.visit_any_argument(next(Rule::any_argument)?)?;
        let arg2 = self.visit_any_argument(next(Rule::any_argument)?)?;

        Ok(BinaryNode {
            op,
            lhs,
            arg1,
            arg2,
        })
    }

    pub fn visit_binary_operator(&self, pair: Pair<'_, Rule>) -> Result<BinaryOperator, LowerError> {
        expect_rule(&pair, Rule::binary_operator)?;
        match pair.as_str() {
            "add" => Ok(BinaryOperator::Add),
            "mul" => Ok(BinaryOperator::Mul),
            text => Err(LowerError::new(
                LowerErrorKind::UnknownOperator {
                    text: text.to_string(),
                },
                pair.as_span().into(),
            )),
        }
    }

    pub fn visit_any_lvalue(&self, pair: Pair<'_, Rule>) -> Result<LValueNode, LowerError> {
        expect_rule(&pair, Rule::any_lvalue)?;
        let ident = child(&pair, Rule::ident)?;
        Ok(LValueNode {
            name: ident.as_str().to_string(),
        })
    }

    pub fn visit_any_argument(&self, pair: Pair<'_, Rule>) -> Result<ArgNode, LowerError> {
        expect_rule(&pair, Rule::any_argument)?;
        let inner = first_child(&pair)?;
        match inner.as_rule() {
            Rule::any_rvalue => Ok(ArgNode::RValue(self.visit_any_rvalue(inner)?)),
            Rule::any_number => Ok(ArgNode::Immediate(self.visit_any_number(inner)?)),
            found => Err(LowerError::new(
                LowerErrorKind::UnexpectedNode {
                    expected: Rule::any_number,
                    found,
                },
                inner.as_span().into(),
            )),
        }
    }

    pub fn visit_any_rvalue(&self, pair: Pair<'_, Rule>) -> Result<RValueNode, LowerError> {
        expect_rule(&pair, Rule::any_rvalue)?;
        let ident = child(&pair, Rule::ident)?;
        Ok(RValueNode {
            name: ident.as_str().to_string(),
        })
    }

    /// Text containing a `.` is a float; anything else is a 64-bit integer.
    pub fn visit_any_number(&self, pair: Pair<'_, Rule>) -> Result<ImmediateNode, LowerError> {
        expect_rule(&pair, Rule::any_number)?;
        let text = pair.as_str();
        let parsed = if text.contains('.') {
            text.parse().map(ImmediateNode::Float).ok()
        } else {
            text.parse().map(ImmediateNode::Int).ok()
        };
        parsed.ok_or_else(|| {
            LowerError::new(
                LowerErrorKind::InvalidNumber {
                    text: text.to_string(),
                },
                pair.as_span().into(),
            )
        })
    }

    pub fn visit_ident(&self, pair: Pair<'_, Rule>) -> Result<IdNode, LowerError> {
        expect_rule(&pair, Rule::ident)?;
        Ok(IdNode::new(pair.as_str()))
    }
}

// === Child accessors ===

fn expect_rule(pair: &Pair<'_, Rule>, expected: Rule) -> Result<(), LowerError> {
    if pair.as_rule() == expected {
        Ok(())
    } else {
        Err(LowerError::new(
            LowerErrorKind::UnexpectedNode {
                expected,
                found: pair.as_rule(),
            },
            pair.as_span().into(),
        ))
    }
}

fn children<'i>(pair: Pair<'i, Rule>, rule: Rule) -> impl Iterator<Item = Pair<'i, Rule>> {
    pair.into_inner().filter(move |child| child.as_rule() == rule)
}

fn find_child<'i>(pair: &Pair<'i, Rule>, rule: Rule) -> Option<Pair<'i, Rule>> {
    children(pair.clone(), rule).next()
}

fn child<'i>(pair: &Pair<'i, Rule>, rule: Rule) -> Result<Pair<'i, Rule>, LowerError> {
    find_child(pair, rule).ok_or_else(|| missing(pair, rule))
}

fn first_child<'i>(pair: &Pair<'i, Rule>) -> Result<Pair<'i, Rule>, LowerError> {
    pair.clone().into_inner().next().ok_or_else(|| {
        LowerError::new(
            LowerErrorKind::NotAProduction {
                rule: pair.as_rule(),
            },
            pair.as_span().into(),
        )
    })
}

fn missing(pair: &Pair<'_, Rule>, child: Rule) -> LowerError {
    LowerError::new(
        LowerErrorKind::MissingChild {
            parent: pair.as_rule(),
            child,
        },
        pair.as_span().into(),
    )
}

fn unsupported(pair: &Pair<'_, Rule>) -> LowerError {
    let form = match pair.as_rule() {
        Rule::print_instruction => "print",
        Rule::memory_instruction => "memory",
        Rule::arrow_instruction => "arrow",
        _ => "no-argument",
    };
    LowerError::new(
        LowerErrorKind::UnsupportedInstruction { form },
        pair.as_span().into(),
    )
}
