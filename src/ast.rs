use std::fmt;
use std::rc::Rc;

pub type Program = Vec<Node>;

#[derive(PartialEq, Debug, Clone)]
pub enum Node {
    // Literals
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Array(Vec<Node>),
    // Keys stay unevaluated until the literal itself is evaluated.
    Map(Vec<(Node, Node)>),
    Function(Rc<FunctionLiteral>),

    Identifier(String),
    Prefix(Prefix, Box<Node>),
    Infix(Infix, Box<Node>, Box<Node>),
    Index {
        subject: Box<Node>,
        index: Box<Node>,
    },
    Range {
        from: Box<Node>,
        to: Box<Node>,
        step: Option<Box<Node>>,
    },
    Call {
        function: Box<Node>,
        arguments: Vec<Node>,
    },

    // Control flow
    If {
        condition: Box<Node>,
        consequence: Program,
        alternative: Option<Program>,
    },
    For {
        key: String,
        value: Option<String>,
        target: Box<Node>,
        body: Program,
    },
    Return(Box<Node>),

    // Statement-shaped
    Assign {
        target: Box<Node>,
        value: Box<Node>,
    },
    Swap(Box<Node>, Box<Node>),

    // Builtins
    Print {
        arguments: Vec<Node>,
        newline: bool,
    },
    Input(Box<Node>),
    Len(Box<Node>),
    Import(Box<Node>),
}

#[derive(PartialEq, Debug)]
pub struct FunctionLiteral {
    pub name: Option<String>,
    pub parameters: Vec<String>,
    pub body: Program,
}

#[derive(PartialEq, Debug, Clone, Copy)]
pub enum Prefix {
    Minus,
    Bang,
}

#[derive(PartialEq, Debug, Clone, Copy)]
pub enum Infix {
    Plus,
    Minus,
    Product,
    ForwardSlash,
    Equal,
    DoesNotEqual,
    GreaterThan,
    LessThan,
    GTOrEqual,
    LTOrEqual,
    And,
    Or,
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prefix::Minus => write!(f, "-"),
            Prefix::Bang => write!(f, "!"),
        }
    }
}

impl fmt::Display for Infix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Infix::Plus => "+",
            Infix::Minus => "-",
            Infix::Product => "*",
            Infix::ForwardSlash => "/",
            Infix::Equal => "==",
            Infix::DoesNotEqual => "!=",
            Infix::GreaterThan => ">",
            Infix::LessThan => "<",
            Infix::GTOrEqual => ">=",
            Infix::LTOrEqual => "<=",
            Infix::And => "and",
            Infix::Or => "or",
        };
        write!(f, "{}", symbol)
    }
}
