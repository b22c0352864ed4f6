//! Named variables and constraints on top of `good_lp` expressions.
//!
//! `good_lp` does the algebra and the solving. A `Model` additionally remembers names,
//! bounds and constraint rows, so that the same model can be checked against an
//! assignment, handed to more than one solver and exported.
use std::collections::{HashMap, HashSet};
use std::fmt;

use good_lp::{constraint, variable, IntoAffineExpression, ProblemVariables};
use serde::Serialize;

use crate::error::{Result, SndError};

pub use good_lp::{Expression, Variable};

/// Values of the variables of a model. Missing variables are zero.
pub type Assignment = HashMap<Variable, f64>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VarType {
    Continuous,
    Integer,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarDef {
    pub name: String,
    pub vtype: VarType,
    pub lb: f64,
    pub ub: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConstrSense {
    Less,
    Equal,
    Greater,
}

impl fmt::Display for ConstrSense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstrSense::Less => write!(f, "<="),
            ConstrSense::Equal => write!(f, "="),
            ConstrSense::Greater => write!(f, ">="),
        }
    }
}

/// The value of a linear expression. Model expressions carry no constant.
pub fn evaluate(expr: &Expression, values: &Assignment) -> f64 {
    expr.clone()
        .linear_coefficients()
        .into_iter()
        .map(|(var, coeff)| coeff * values.get(&var).copied().unwrap_or(0.0))
        .sum()
}

/// A named constraint `lhs <sense> rhs`
#[derive(Debug, Clone)]
pub struct Constr {
    pub name: String,
    pub lhs: Expression,
    pub sense: ConstrSense,
    pub rhs: f64,
}

impl Constr {
    /// The non-zero coefficients of the left hand side
    pub fn terms(&self) -> Vec<(Variable, f64)> {
        self.lhs
            .clone()
            .linear_coefficients()
            .into_iter()
            .filter(|&(_, coeff)| coeff != 0.0)
            .collect()
    }

    /// By how much the constraint is violated for the given values (0 if satisfied)
    pub fn violation(&self, values: &Assignment) -> f64 {
        let lhs = evaluate(&self.lhs, values);
        match self.sense {
            ConstrSense::Less => (lhs - self.rhs).max(0.0),
            ConstrSense::Greater => (self.rhs - lhs).max(0.0),
            ConstrSense::Equal => (lhs - self.rhs).abs(),
        }
    }

    pub fn to_good_lp(&self) -> good_lp::Constraint {
        let lhs = self.lhs.clone();
        let rhs = self.rhs;
        match self.sense {
            ConstrSense::Less => constraint!(lhs <= rhs),
            ConstrSense::Equal => constraint!(lhs == rhs),
            ConstrSense::Greater => constraint!(lhs >= rhs),
        }
    }
}

/// A violated bound, integrality requirement or constraint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    pub name: String,
    pub amount: f64,
}

/// Replaces characters that LP files do not allow in names
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            c if c.is_whitespace() => '_',
            ':' | '+' | '-' | '*' | '^' | '<' | '>' | '=' | '[' | ']' => '_',
            c => c,
        })
        .collect()
}

/// `name`, sanitized and suffixed with `#k` if it is already taken
fn unique(taken: &mut HashSet<String>, name: &str) -> String {
    let base = sanitize(name);
    let mut name = base.clone();
    let mut k = 1;
    while taken.contains(&name) {
        name = format!("{base}#{k}");
        k += 1;
    }
    taken.insert(name.clone());
    name
}

/// A minimization problem
pub struct Model {
    name: String,
    problem: ProblemVariables,
    variables: Vec<Variable>,
    defs: Vec<VarDef>,
    position: HashMap<Variable, usize>,
    var_names: HashSet<String>,
    constrs: Vec<Constr>,
    constr_names: HashSet<String>,
    objective: Expression,
}

impl Model {
    pub fn new(name: &str) -> Model {
        Model {
            name: name.to_string(),
            problem: ProblemVariables::new(),
            variables: Vec::new(),
            defs: Vec::new(),
            position: HashMap::new(),
            var_names: HashSet::new(),
            constrs: Vec::new(),
            constr_names: HashSet::new(),
            objective: Expression::with_capacity(0),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn definition(def: &VarDef) -> good_lp::VariableDefinition {
        let var = variable().min(def.lb).max(def.ub).name(def.name.clone());
        match def.vtype {
            VarType::Continuous => var,
            VarType::Integer => var.integer(),
        }
    }

    /// Adds a variable. Names are made unique, so the stored name may differ from `name`.
    pub fn add_var(&mut self, name: &str, vtype: VarType, lb: f64, ub: f64) -> Variable {
        let def = VarDef {
            name: unique(&mut self.var_names, name),
            vtype,
            lb,
            ub,
        };
        let var = self.problem.add(Self::definition(&def));
        self.position.insert(var, self.defs.len());
        self.variables.push(var);
        self.defs.push(def);
        var
    }

    /// Adds `lhs <sense> rhs`. `lhs` must not contain a constant.
    pub fn add_constr(&mut self, name: &str, lhs: Expression, sense: ConstrSense, rhs: f64) {
        let name = unique(&mut self.constr_names, name);
        self.constrs.push(Constr {
            name,
            lhs,
            sense,
            rhs,
        });
    }

    pub fn set_objective(&mut self, objective: Expression) {
        self.objective = objective;
    }

    /// Declares the variables of the model, in order, for a fresh `good_lp` problem
    pub fn declare(&self) -> Result<(ProblemVariables, &[Variable])> {
        let mut problem = ProblemVariables::new();
        for (&var, def) in self.variables.iter().zip(&self.defs) {
            if problem.add(Self::definition(def)) != var {
                return Err(SndError::Solver(format!(
                    "variable {} changed position while declaring {}",
                    def.name, self.name
                )));
            }
        }
        Ok((problem, &self.variables))
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn var(&self, var: Variable) -> &VarDef {
        &self.defs[self.position[&var]]
    }

    pub fn vars(&self) -> impl Iterator<Item = (Variable, &VarDef)> + '_ {
        self.variables.iter().copied().zip(&self.defs)
    }

    /// The variable with the given name, if any
    pub fn var_by_name(&self, name: &str) -> Option<Variable> {
        self.vars().find(|(_, def)| def.name == name).map(|(var, _)| var)
    }

    pub fn constrs(&self) -> &[Constr] {
        &self.constrs
    }

    /// The constraint with the given name, if any
    pub fn constr_by_name(&self, name: &str) -> Option<&Constr> {
        self.constrs.iter().find(|c| c.name == name)
    }

    pub fn objective(&self) -> &Expression {
        &self.objective
    }

    pub fn num_vars(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constrs(&self) -> usize {
        self.constrs.len()
    }

    pub fn objective_value(&self, values: &Assignment) -> f64 {
        evaluate(&self.objective, values)
    }

    /// Checks `values` against every bound, integrality requirement and constraint of the
    /// model, returning everything violated by more than `tolerance`.
    pub fn violations(&self, values: &Assignment, tolerance: f64) -> Vec<Violation> {
        let mut violations = Vec::new();

        for (var, def) in self.vars() {
            let value = values.get(&var).copied().unwrap_or(0.0);
            let amount = (def.lb - value).max(value - def.ub).max(0.0);
            if amount > tolerance {
                violations.push(Violation {
                    name: format!("bound({})", def.name),
                    amount,
                });
            }
            if def.vtype == VarType::Integer && (value - value.round()).abs() > tolerance {
                violations.push(Violation {
                    name: format!("integrality({})", def.name),
                    amount: (value - value.round()).abs(),
                });
            }
        }

        for c in &self.constrs {
            let amount = c.violation(values);
            if amount > tolerance {
                violations.push(Violation {
                    name: c.name.clone(),
                    amount,
                });
            }
        }

        violations
    }
}
