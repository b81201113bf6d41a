//! Named per-entity fields attached to the cells or faces of a mesh.
//!
//! Fields are indexed by the dense entity index of the mesh. A [`DenseField`] stores a value for
//! every entity, while a [`SparseField`] only stores values for a subset, such as the boundary
//! faces of a mesh.
use crate::tensor::DiffusionTensor;
use num::ToPrimitive;
use std::collections::BTreeMap;
use std::ops::{Index, IndexMut};

#[derive(Debug, Clone, PartialEq)]
pub struct DenseField<V> {
    name: String,
    values: Vec<V>,
}

impl<V> DenseField<V> {
    pub fn from_values(name: impl Into<String>, values: Vec<V>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&V> {
        self.values.get(index)
    }

    pub fn values(&self) -> &[V] {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut [V] {
        &mut self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = &V> {
        self.values.iter()
    }
}

impl<V: Clone> DenseField<V> {
    pub fn new(name: impl Into<String>, len: usize, fill: V) -> Self {
        Self::from_values(name, vec![fill; len])
    }
}

impl<V> Index<usize> for DenseField<V> {
    type Output = V;

    fn index(&self, index: usize) -> &V {
        &self.values[index]
    }
}

impl<V> IndexMut<usize> for DenseField<V> {
    fn index_mut(&mut self, index: usize) -> &mut V {
        &mut self.values[index]
    }
}

/// A field with values for only some of the entities in `0 .. len`.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseField<V> {
    name: String,
    len: usize,
    values: BTreeMap<usize, V>,
}

impl<V> SparseField<V> {
    pub fn new(name: impl Into<String>, len: usize) -> Self {
        Self {
            name: name.into(),
            len,
            values: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The number of entities the field is defined over.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The number of entities that currently hold a value.
    pub fn num_entries(&self) -> usize {
        self.values.len()
    }

    pub fn get(&self, index: usize) -> Option<&V> {
        self.values.get(&index)
    }

    pub fn contains(&self, index: usize) -> bool {
        self.values.contains_key(&index)
    }

    /// Stores a value for the given entity, returning the previous value if present.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not smaller than [`len`](Self::len).
    pub fn insert(&mut self, index: usize, value: V) -> Option<V> {
        assert!(
            index < self.len,
            "Entity index {} out of bounds for field \"{}\" of length {}",
            index,
            self.name,
            self.len
        );
        self.values.insert(index, value)
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Iterates over `(index, value)` pairs in increasing index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &V)> {
        self.values.iter().map(|(idx, value)| (*idx, value))
    }
}

/// A value that can be written as a fixed number of real components.
pub trait FieldValue {
    fn num_components() -> usize;

    fn write_components(&self, components: &mut Vec<f64>);
}

macro_rules! impl_scalar_field_value {
    ($($t:ty),*) => {
        $(
            impl FieldValue for $t {
                fn num_components() -> usize {
                    1
                }

                fn write_components(&self, components: &mut Vec<f64>) {
                    components.push(self.to_f64().unwrap_or(f64::NAN));
                }
            }
        )*
    };
}

impl_scalar_field_value!(f32, f64, i32, i64, usize);

impl<T: ToPrimitive> FieldValue for DiffusionTensor<T> {
    fn num_components() -> usize {
        3
    }

    fn write_components(&self, components: &mut Vec<f64>) {
        for entry in [&self.xx, &self.yy, &self.xy] {
            components.push(entry.to_f64().unwrap_or(f64::NAN));
        }
    }
}

/// A named field that can be exported as a per-entity attribute.
pub trait FieldAttribute {
    fn name(&self) -> &str;

    /// Number of entities the field is defined over.
    fn num_entities(&self) -> usize;

    fn num_components(&self) -> usize;

    /// Appends the components of the value at `index`, or NaN for every component if the
    /// entity has no value.
    fn write_entity(&self, index: usize, components: &mut Vec<f64>);
}

fn write_nan(num_components: usize, components: &mut Vec<f64>) {
    components.extend(std::iter::repeat(f64::NAN).take(num_components));
}

impl<V: FieldValue> FieldAttribute for DenseField<V> {
    fn name(&self) -> &str {
        &self.name
    }

    fn num_entities(&self) -> usize {
        self.len()
    }

    fn num_components(&self) -> usize {
        V::num_components()
    }

    fn write_entity(&self, index: usize, components: &mut Vec<f64>) {
        match self.get(index) {
            Some(value) => value.write_components(components),
            None => write_nan(V::num_components(), components),
        }
    }
}

impl<V: FieldValue> FieldAttribute for SparseField<V> {
    fn name(&self) -> &str {
        &self.name
    }

    fn num_entities(&self) -> usize {
        self.len
    }

    fn num_components(&self) -> usize {
        V::num_components()
    }

    fn write_entity(&self, index: usize, components: &mut Vec<f64>) {
        match self.get(index) {
            Some(value) => value.write_components(components),
            None => write_nan(V::num_components(), components),
        }
    }
}
