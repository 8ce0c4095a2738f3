// used to print out readable forms of a data type
use std::fmt;
// used to get concrete values back out of an erased cell
use std::any::Any;

/// A value that can travel inside a [`TypedCell`].
///
/// `UID` is the runtime tag compared before any value is copied between
/// cells, `DATA_TYPE` a readable name for the same tag.
pub trait DataType: fmt::Display + Clone + PartialEq + Send + Sync + 'static {
    // static stuff which needs to be implemented downstream
    const UID: u8;
    const DATA_TYPE: &'static str;
    // instance callable with pre-made implementation
    fn data_type(&self) -> &'static str {
        Self::DATA_TYPE
    }
    fn identifier(&self) -> u8 {
        Self::UID
    }
}

// ------------- Data Types --------------
impl DataType for String {
    const UID: u8 = 1;
    const DATA_TYPE: &'static str = "String";
}
impl DataType for f32 {
    const UID: u8 = 2;
    const DATA_TYPE: &'static str = "f32";
}
impl DataType for f64 {
    const UID: u8 = 3;
    const DATA_TYPE: &'static str = "f64";
}
impl DataType for i32 {
    const UID: u8 = 4;
    const DATA_TYPE: &'static str = "i32";
}
impl DataType for i64 {
    const UID: u8 = 5;
    const DATA_TYPE: &'static str = "i64";
}
impl DataType for u32 {
    const UID: u8 = 6;
    const DATA_TYPE: &'static str = "u32";
}
impl DataType for u64 {
    const UID: u8 = 7;
    const DATA_TYPE: &'static str = "u64";
}
impl DataType for bool {
    const UID: u8 = 8;
    const DATA_TYPE: &'static str = "bool";
}

// the capability set every erased value offers
trait Erased: Send + Sync {
    fn identifier(&self) -> u8;
    fn data_type(&self) -> &'static str;
    fn as_any(&self) -> &dyn Any;
    fn duplicate(&self) -> Box<dyn Erased>;
    fn render(&self) -> String;
    fn assign(&mut self, other: &dyn Erased) -> bool;
    fn same_value(&self, other: &dyn Erased) -> bool;
}

impl<V: DataType> Erased for V {
    fn identifier(&self) -> u8 {
        V::UID
    }
    fn data_type(&self) -> &'static str {
        V::DATA_TYPE
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn duplicate(&self) -> Box<dyn Erased> {
        Box::new(self.clone())
    }
    fn render(&self) -> String {
        self.to_string()
    }
    fn assign(&mut self, other: &dyn Erased) -> bool {
        if other.identifier() != V::UID {
            return false;
        }
        match other.as_any().downcast_ref::<V>() {
            Some(value) => {
                *self = value.clone();
                true
            }
            None => false,
        }
    }
    fn same_value(&self, other: &dyn Erased) -> bool {
        other.identifier() == V::UID
            && other.as_any().downcast_ref::<V>().is_some_and(|value| value == self)
    }
}

// ------------- TypedCell -------------
/// A single owner, type tagged value. Moving it hands over ownership; `clone`
/// is the only way to end up with two.
pub struct TypedCell(Box<dyn Erased>);

impl TypedCell {
    pub fn new<V: DataType>(value: V) -> Self {
        Self(Box::new(value))
    }
    pub fn identifier(&self) -> u8 {
        self.0.identifier()
    }
    pub fn data_type(&self) -> &'static str {
        self.0.data_type()
    }
    pub fn is<V: DataType>(&self) -> bool {
        self.identifier() == V::UID && self.0.as_any().is::<V>()
    }
    pub fn value<V: DataType>(&self) -> Option<&V> {
        if self.identifier() != V::UID {
            return None;
        }
        self.0.as_any().downcast_ref::<V>()
    }
    /// Consumes the cell. On a type mismatch the cell is handed back untouched.
    pub fn into_value<V: DataType>(self) -> Result<V, TypedCell> {
        if let Some(value) = self.value::<V>() {
            return Ok(value.clone());
        }
        Err(self)
    }
    /// Takes the value of `other` if both cells carry the same type. A mismatch
    /// leaves this cell as it was and returns `false`.
    pub fn copy(&mut self, other: &TypedCell) -> bool {
        self.0.assign(other.0.as_ref())
    }
    pub fn set_value<V: DataType>(&mut self, value: V) -> bool {
        self.copy(&TypedCell::new(value))
    }
}

impl Clone for TypedCell {
    fn clone(&self) -> Self {
        Self(self.0.duplicate())
    }
}
impl PartialEq for TypedCell {
    fn eq(&self, other: &Self) -> bool {
        self.0.same_value(other.0.as_ref())
    }
}
impl fmt::Display for TypedCell {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0.render())
    }
}
impl fmt::Debug for TypedCell {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "TypedCell<{}>({})", self.data_type(), self.0.render())
    }
}
