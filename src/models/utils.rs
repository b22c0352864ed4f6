use std::collections::HashMap;
use std::hash::Hash;
use std::ops::Range;

use typed_index_collections::TiVec;

use super::linear::{Assignment, Model, VarType, Variable};

pub trait AddVars {
    type Out;
    type Key;

    /// Create a variable for every index, named by `name`
    fn vars<N: Fn(&Self::Key) -> String>(
        self,
        model: &mut Model,
        name: N,
        vtype: VarType,
        bounds: &Range<f64>,
    ) -> Self::Out;

    /// A continuous non-negative variable
    fn cont<N: Fn(&Self::Key) -> String>(self, model: &mut Model, name: N) -> Self::Out
    where
        Self: Sized,
    {
        self.vars(model, name, VarType::Continuous, &(0.0..f64::INFINITY))
    }

    /// Integer variables within `bounds`
    fn int<N: Fn(&Self::Key) -> String>(
        self,
        model: &mut Model,
        name: N,
        bounds: &Range<f64>,
    ) -> Self::Out
    where
        Self: Sized,
    {
        self.vars(model, name, VarType::Integer, bounds)
    }
}

/// Sparse variables, one for every key produced by the iterator
impl<K, I> AddVars for I
where
    I: IntoIterator<Item = K>,
    K: Hash + Eq,
{
    type Out = HashMap<K, Variable>;
    type Key = K;

    fn vars<N: Fn(&K) -> String>(
        self,
        model: &mut Model,
        name: N,
        vtype: VarType,
        bounds: &Range<f64>,
    ) -> Self::Out {
        self.into_iter()
            .map(|key| {
                let var = model.add_var(&name(&key), vtype, bounds.start, bounds.end);
                (key, var)
            })
            .collect()
    }
}

/// Trait that converts model variables to their values in a solution
pub trait ConvertVars {
    type Out;
    fn convert(&self, values: &Assignment) -> Self::Out;
}

impl ConvertVars for Variable {
    type Out = f64;

    fn convert(&self, values: &Assignment) -> Self::Out {
        values.get(self).copied().unwrap_or(0.0)
    }
}

impl<T: ConvertVars> ConvertVars for Vec<T> {
    type Out = Vec<T::Out>;

    fn convert(&self, values: &Assignment) -> Self::Out {
        self.iter().map(|e| e.convert(values)).collect()
    }
}

impl<K, T: ConvertVars> ConvertVars for TiVec<K, T> {
    type Out = TiVec<K, T::Out>;

    fn convert(&self, values: &Assignment) -> Self::Out {
        self.iter().map(|e| e.convert(values)).collect()
    }
}

impl<K: Hash + Eq + Clone, T: ConvertVars> ConvertVars for HashMap<K, T> {
    type Out = HashMap<K, T::Out>;

    fn convert(&self, values: &Assignment) -> Self::Out {
        self.iter()
            .map(|(k, v)| (k.clone(), v.convert(values)))
            .collect()
    }
}
