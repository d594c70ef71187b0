//! User-defined functions
//!
//! Function bodies are native closures supplied by the embedding program. An
//! aggregate body receives the collected values of its first argument plus the
//! remaining arguments evaluated once.

use std::{fmt, sync::Arc};

use tabview_types::Value;

use super::Arity;
use crate::errors::Result;

pub type ScalarBody = dyn Fn(&[Value]) -> Result<Value> + Send + Sync;
pub type AggregateBody = dyn Fn(&[Value], &[Value]) -> Result<Value> + Send + Sync;

#[derive(Clone)]
pub enum FunctionBody {
    Scalar(Arc<ScalarBody>),
    Aggregate(Arc<AggregateBody>),
}

#[derive(Clone)]
pub struct UserDefinedFunction {
    name: String,
    arity: Arity,
    body: FunctionBody,
}

impl UserDefinedFunction {
    pub fn scalar<F>(name: impl Into<String>, arity: Arity, body: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        UserDefinedFunction { name: name.into(), arity, body: FunctionBody::Scalar(Arc::new(body)) }
    }

    /// `arity` counts every argument of a call, including the aggregated one.
    pub fn aggregate<F>(name: impl Into<String>, arity: Arity, body: F) -> Self
    where
        F: Fn(&[Value], &[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        UserDefinedFunction {
            name: name.into(),
            arity,
            body: FunctionBody::Aggregate(Arc::new(body)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arity(&self) -> Arity {
        self.arity
    }

    pub fn is_aggregate(&self) -> bool {
        matches!(self.body, FunctionBody::Aggregate(_))
    }

    pub fn call(&self, args: &[Value]) -> Result<Value> {
        self.arity.check(&self.name, args.len())?;
        match &self.body {
            FunctionBody::Scalar(f) => f(args),
            // Called as a scalar: aggregate over the single value given.
            FunctionBody::Aggregate(f) => {
                let (first, rest) = args.split_first().map(|(a, r)| (vec![a.clone()], r)).unwrap_or_default();
                f(&first, rest)
            }
        }
    }

    pub fn call_aggregate(&self, list: &[Value], args: &[Value]) -> Result<Value> {
        self.arity.check(&self.name, args.len() + 1)?;
        match &self.body {
            FunctionBody::Aggregate(f) => f(list, args),
            FunctionBody::Scalar(f) => {
                let mut all = Vec::with_capacity(args.len() + 1);
                all.push(list.first().cloned().unwrap_or_default());
                all.extend_from_slice(args);
                f(&all)
            }
        }
    }
}

impl fmt::Debug for UserDefinedFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserDefinedFunction")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .field("aggregate", &self.is_aggregate())
            .finish()
    }
}
