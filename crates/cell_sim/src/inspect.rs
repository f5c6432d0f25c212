//! Read access to a module instance's settled state.

use crate::error::SimError;
use crate::instance::{InstanceId, ModuleInstance};
use crate::runset::Runset;
use cell_ir::{Value, PORT_ELEMENT};

/// A read-only view of one instance, returned by
/// [`SimKernel::inspect`](crate::SimKernel::inspect).
///
/// All reads come from `current`, i.e. the values as of the last completed
/// delta cycle.
#[derive(Debug, Clone, Copy)]
pub struct ModuleInspector<'k> {
    runset: &'k Runset,
    id: InstanceId,
}

impl<'k> ModuleInspector<'k> {
    pub(crate) fn new(runset: &'k Runset, id: InstanceId) -> Self {
        Self { runset, id }
    }

    fn instance(&self) -> &'k ModuleInstance {
        self.runset.instance(self.id)
    }

    /// The instance's ID in the runset.
    pub fn id(&self) -> InstanceId {
        self.id
    }

    /// Fully qualified name of the instantiated module.
    pub fn module_name(&self) -> &'k str {
        &self.instance().module.name
    }

    /// Dotted instance path, empty for the top.
    pub fn path(&self) -> &'k str {
        self.instance().path()
    }

    /// Number of structural elements, including the port.
    pub fn element_count(&self) -> usize {
        self.instance().frame.layout().element_count()
    }

    /// Element names by index.
    pub fn element_names(&self) -> &'k [String] {
        &self.instance().module.element_names
    }

    /// Names of the functions callable through
    /// [`SimKernel::call`](crate::SimKernel::call).
    pub fn function_names(&self) -> &'k [String] {
        &self.instance().module.function_names
    }

    fn element(&self, name: &str) -> Result<usize, SimError> {
        self.instance()
            .module
            .element_index(name)
            .ok_or_else(|| SimError::UnknownElement {
                module: self.module_name().to_string(),
                element: name.to_string(),
            })
    }

    /// The value of a named element.
    pub fn get(&self, name: &str) -> Result<Value, SimError> {
        let index = self.element(name)?;
        self.get_index(index).ok_or_else(|| SimError::NotScalar {
            module: self.module_name().to_string(),
            element: name.to_string(),
        })
    }

    /// The value of an element by index, `None` if the index is out of range
    /// or the element is not a scalar.
    pub fn get_index(&self, index: usize) -> Option<Value> {
        let frame = &self.instance().frame;
        if index >= frame.layout().element_count() {
            return None;
        }
        frame.value(index)
    }

    /// The value a named element had before the latest time step.
    pub fn get_previous(&self, name: &str) -> Result<Value, SimError> {
        let index = self.element(name)?;
        let frame = &self.instance().frame;
        let e = frame.layout().element(index);
        Value::decode(&e.ty, &frame.previous()[e.range()]).ok_or_else(|| SimError::NotScalar {
            module: self.module_name().to_string(),
            element: name.to_string(),
        })
    }

    /// The value of a named port field.
    pub fn get_port(&self, field: &str) -> Result<Value, SimError> {
        let inst = self.instance();
        let unknown = || SimError::UnknownElement {
            module: self.module_name().to_string(),
            element: field.to_string(),
        };
        let index = inst.module.port_index(field).ok_or_else(unknown)?;
        let layout = inst.frame.layout();
        let f = layout.port_field(index);
        let start = layout.element(PORT_ELEMENT).offset + f.offset;
        let bytes = &inst.frame.current()[start..start + f.ty.size()];
        Value::decode(&f.ty, bytes).ok_or_else(unknown)
    }

    /// Raw bytes of a named element.
    pub fn raw(&self, name: &str) -> Result<&'k [u8], SimError> {
        let index = self.element(name)?;
        Ok(self.instance().frame.element_bytes(index))
    }

    /// Raw bytes of the whole instance.
    pub fn raw_all(&self) -> &'k [u8] {
        self.instance().frame.current()
    }

    /// Bits of a named element, least significant bit of the first byte
    /// first.
    pub fn bits(&self, name: &str) -> Result<Vec<bool>, SimError> {
        Ok(to_bits(self.raw(name)?))
    }

    /// Bits of the whole instance, in the same order as [`bits`](Self::bits).
    pub fn bits_all(&self) -> Vec<bool> {
        to_bits(self.raw_all())
    }
}

fn to_bits(bytes: &[u8]) -> Vec<bool> {
    bytes
        .iter()
        .flat_map(|b| (0..8).map(move |i| b & (1 << i) != 0))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cell_common::Interner;
    use cell_ir::{Design, ModuleBuilder, ValueType};

    fn runset(interner: &Interner) -> Runset {
        let mut design = Design::new();
        let mut m = ModuleBuilder::new("test::regs", interner);
        m.port("out", ValueType::Int);
        m.element_with_init("flag", Value::Bool(true));
        m.element_with_init("n", Value::Int(0x0102));
        let leaf = design.add_module(m.build().unwrap());
        let mut top = ModuleBuilder::new("test::top", interner);
        top.instance("r", leaf);
        let top = design.add_module(top.build().unwrap());

        let mut rs = Runset::new(&design, interner);
        rs.add_module(top, String::new(), None);
        rs.call_init();
        rs
    }

    #[test]
    fn named_and_indexed_reads() {
        let interner = Interner::new();
        let rs = runset(&interner);
        let inspector = ModuleInspector::new(&rs, rs.find("r").unwrap());
        assert_eq!(inspector.module_name(), "test::regs");
        assert_eq!(inspector.path(), "r");
        assert_eq!(inspector.element_count(), 3);
        assert_eq!(inspector.element_names(), ["port", "flag", "n"]);
        assert_eq!(inspector.get("flag").unwrap(), Value::Bool(true));
        assert_eq!(inspector.get_index(2), Some(Value::Int(0x0102)));
        assert_eq!(inspector.get_index(9), None);
        assert_eq!(inspector.get_port("out").unwrap(), Value::Int(0));
        assert_eq!(inspector.get_previous("n").unwrap(), Value::Int(0x0102));
    }

    #[test]
    fn lookup_errors() {
        let interner = Interner::new();
        let rs = runset(&interner);
        let inspector = ModuleInspector::new(&rs, rs.find("r").unwrap());
        assert!(matches!(
            inspector.get("missing"),
            Err(SimError::UnknownElement { .. })
        ));
        assert!(matches!(inspector.get("port"), Err(SimError::NotScalar { .. })));
        assert!(matches!(
            inspector.get_port("nope"),
            Err(SimError::UnknownElement { .. })
        ));
    }

    #[test]
    fn raw_and_bits() {
        let interner = Interner::new();
        let rs = runset(&interner);
        let inspector = ModuleInspector::new(&rs, rs.find("r").unwrap());
        assert_eq!(inspector.raw("n").unwrap(), [2, 1, 0, 0, 0, 0, 0, 0]);
        let bits = inspector.bits("flag").unwrap();
        assert_eq!(bits, [true, false, false, false, false, false, false, false]);
        assert_eq!(inspector.raw_all().len(), 17);
        assert_eq!(inspector.bits_all().len(), 17 * 8);
    }

    #[test]
    fn top_instance_has_slot_element() {
        let interner = Interner::new();
        let rs = runset(&interner);
        let inspector = ModuleInspector::new(&rs, rs.root().unwrap());
        assert_eq!(inspector.path(), "");
        assert_eq!(inspector.element_names(), ["port", "r"]);
        assert!(matches!(inspector.get("r"), Err(SimError::NotScalar { .. })));
        assert!(inspector.raw_all().is_empty());
    }
}
