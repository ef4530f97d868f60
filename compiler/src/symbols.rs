//! Symbol model: classes, method and block scopes, variables and the
//! per-class literal tables.
//!
//! Everything lives in index-addressed vectors owned by [`SymbolTable`];
//! the syntax tree refers to entries through [`ClassId`] and [`ScopeId`].
//! Scopes are created and mutated only while symbols are defined. Once
//! resolution starts the table is read-only, except for the literal tables
//! and the compiled artifacts that code generation fills in.

use std::collections::HashMap;
use std::sync::Arc;

use crate::compiled::CompiledBlock;
use crate::span::Span;

/// Name of the root class every table starts with.
pub const ROOT_CLASS: &str = "Object";

/// Most fields, variables or blocks one class or scope can number. Slots
/// are `u16` operands and counts must fit alongside them.
pub const MAX_SLOTS: usize = u16::MAX as usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(u32);

impl ClassId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl ScopeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// How an identifier reference was classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Binding {
    /// Receiver field; `index` counts inherited fields first.
    Field { index: u16 },
    /// Argument of the scope `depth` levels out from the reference.
    Argument { depth: u16, index: u16 },
    /// Local of the scope `depth` levels out from the reference.
    Local { depth: u16, index: u16 },
    /// Looked up by name when the VM loads the code.
    Global,
}

// ── Literal table ───────────────────────────────────────────────────

/// Insertion-ordered, deduplicating string pool.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringTable {
    strings: Vec<String>,
    index: HashMap<String, usize>,
}

impl StringTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern `s`, returning its index. Re-adding returns the first index.
    pub fn add(&mut self, s: &str) -> usize {
        if let Some(&idx) = self.index.get(s) {
            return idx;
        }
        let idx = self.strings.len();
        self.strings.push(s.to_string());
        self.index.insert(s.to_string(), idx);
        idx
    }

    pub fn get(&self, s: &str) -> Option<usize> {
        self.index.get(s).copied()
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.strings
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.strings.clone()
    }
}

// ── Classes ─────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct FieldSymbol {
    pub name: String,
    pub span: Span,
    /// Class-wide slot, assigned once the superclass chain is laid out.
    pub index: Option<u16>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    Pending,
    InProgress,
    Done,
}

#[derive(Debug, Clone)]
pub struct ClassSymbol {
    pub name: String,
    pub span: Span,
    pub superclass_name: Option<String>,
    /// Bound by [`SymbolTable::bind_superclasses`].
    pub superclass: Option<ClassId>,
    pub fields: Vec<FieldSymbol>,
    pub methods: Vec<ScopeId>,
    pub literals: StringTable,
    /// Pre-existing in the VM rather than declared by the program.
    pub builtin: bool,
    inherited_fields: u16,
    layout: Layout,
}

impl ClassSymbol {
    /// Number of fields including inherited ones.
    pub fn field_count(&self) -> u16 {
        // layout keeps the total within MAX_SLOTS
        self.inherited_fields
            .saturating_add(u16::try_from(self.fields.len()).unwrap_or(u16::MAX))
    }

    pub fn inherited_field_count(&self) -> u16 {
        self.inherited_fields
    }

    pub fn own_field(&self, name: &str) -> Option<&FieldSymbol> {
        self.fields.iter().find(|f| f.name == name)
    }
}

// ── Scopes ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    Argument,
    Local,
}

#[derive(Debug, Clone)]
pub struct VariableSymbol {
    pub name: String,
    pub kind: VariableKind,
    /// Slot in the scope; arguments come first, then locals.
    pub index: u16,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeKind {
    Method {
        selector: String,
        primitive: Option<String>,
    },
    /// `index` is the block's number within its home method.
    Block { index: u16 },
}

#[derive(Debug, Clone)]
pub struct Scope {
    pub kind: ScopeKind,
    pub class: ClassId,
    /// Lexically enclosing scope; `None` for methods.
    pub enclosing: Option<ScopeId>,
    /// The method this scope belongs to (itself for methods).
    pub method: ScopeId,
    pub symbols: Vec<VariableSymbol>,
    /// Blocks directly nested in this scope, in definition order.
    pub blocks: Vec<ScopeId>,
    /// All blocks nested in this scope, transitively.
    pub nested_block_count: u16,
    pub compiled: Option<Arc<CompiledBlock>>,
    next_block_index: u16,
}

impl Scope {
    pub fn is_method(&self) -> bool {
        matches!(self.kind, ScopeKind::Method { .. })
    }

    pub fn block_index(&self) -> Option<u16> {
        match self.kind {
            ScopeKind::Block { index } => Some(index),
            ScopeKind::Method { .. } => None,
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&VariableSymbol> {
        self.symbols.iter().find(|s| s.name == name)
    }

    pub fn nargs(&self) -> u16 {
        self.count(VariableKind::Argument)
    }

    pub fn nlocals(&self) -> u16 {
        self.count(VariableKind::Local)
    }

    fn count(&self, kind: VariableKind) -> u16 {
        let n = self.symbols.iter().filter(|s| s.kind == kind).count();
        // add_variable keeps symbols within MAX_SLOTS
        u16::try_from(n).unwrap_or(u16::MAX)
    }
}

// ── Symbol table ────────────────────────────────────────────────────

/// Root of all lookups for one compilation unit. Its class map is the
/// Globals scope.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    classes: Vec<ClassSymbol>,
    globals: HashMap<String, ClassId>,
    scopes: Vec<Scope>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    /// A table holding only the root class.
    pub fn new() -> Self {
        let mut table = Self {
            classes: Vec::new(),
            globals: HashMap::new(),
            scopes: Vec::new(),
        };
        let root = table.add_class(ROOT_CLASS, None, Span::default());
        table.classes[root.index()].builtin = true;
        table.classes[root.index()].layout = Layout::Done;
        table
    }

    /// Register a class the VM already provides, with its own field names.
    ///
    /// Builtins are laid out immediately, so `superclass` must already be in
    /// the table. Returns `None` if the name is taken, the superclass is
    /// unknown or the fields would not fit in `MAX_SLOTS`.
    pub fn define_builtin_class(
        &mut self,
        name: &str,
        superclass: Option<&str>,
        fields: &[&str],
    ) -> Option<ClassId> {
        if self.globals.contains_key(name) {
            return None;
        }
        let super_id = match superclass {
            Some(s) => Some(self.lookup_class(s)?),
            None => None,
        };
        let inherited = super_id.map_or(0, |id| self.class(id).field_count());
        if usize::from(inherited) + fields.len() > MAX_SLOTS {
            return None;
        }
        let id = self.add_class(name, superclass, Span::default());
        let class = &mut self.classes[id.index()];
        class.builtin = true;
        class.superclass = super_id;
        class.inherited_fields = inherited;
        for (field, index) in fields.iter().zip(inherited..) {
            class.fields.push(FieldSymbol {
                name: field.to_string(),
                span: Span::default(),
                index: Some(index),
            });
        }
        class.layout = Layout::Done;
        Some(id)
    }

    /// Create a class. It is entered in Globals unless the name is already
    /// bound there; callers report that case.
    pub fn add_class(
        &mut self,
        name: &str,
        superclass: Option<&str>,
        span: Span,
    ) -> ClassId {
        let id = ClassId(self.classes.len() as u32);
        self.classes.push(ClassSymbol {
            name: name.to_string(),
            span,
            superclass_name: superclass.map(str::to_string),
            superclass: None,
            fields: Vec::new(),
            methods: Vec::new(),
            literals: StringTable::new(),
            builtin: false,
            inherited_fields: 0,
            layout: Layout::Pending,
        });
        self.globals.entry(name.to_string()).or_insert(id);
        id
    }

    /// Declare a field on `class`.
    pub fn add_field(&mut self, class: ClassId, name: &str, span: Span) -> Result<(), DeclareError> {
        let class = &mut self.classes[class.index()];
        if class.own_field(name).is_some() {
            return Err(DeclareError::Duplicate);
        }
        if class.fields.len() >= MAX_SLOTS {
            return Err(DeclareError::TooMany);
        }
        class.fields.push(FieldSymbol {
            name: name.to_string(),
            span,
            index: None,
        });
        Ok(())
    }

    /// Create a method scope. It is listed in the class's methods unless
    /// the selector is already there; callers report that case.
    pub fn add_method(
        &mut self,
        class: ClassId,
        selector: &str,
        primitive: Option<&str>,
    ) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope {
            kind: ScopeKind::Method {
                selector: selector.to_string(),
                primitive: primitive.map(str::to_string),
            },
            class,
            enclosing: None,
            method: id,
            symbols: Vec::new(),
            blocks: Vec::new(),
            nested_block_count: 0,
            compiled: None,
            next_block_index: 0,
        });
        if self.lookup_method(class, selector).is_none() {
            self.classes[class.index()].methods.push(id);
        }
        id
    }

    /// Create a block scope nested in `enclosing`, numbering it within its
    /// home method. Fails with [`DeclareError::TooMany`] once the method's
    /// block numbers are used up.
    pub fn add_block(&mut self, enclosing: ScopeId) -> Result<ScopeId, DeclareError> {
        let id = ScopeId(self.scopes.len() as u32);
        let parent = &self.scopes[enclosing.index()];
        let (class, method) = (parent.class, parent.method);

        let home = &mut self.scopes[method.index()];
        let index = home.next_block_index;
        home.next_block_index = index.checked_add(1).ok_or(DeclareError::TooMany)?;

        self.scopes.push(Scope {
            kind: ScopeKind::Block { index },
            class,
            enclosing: Some(enclosing),
            method,
            symbols: Vec::new(),
            blocks: Vec::new(),
            nested_block_count: 0,
            compiled: None,
            next_block_index: 0,
        });
        self.scopes[enclosing.index()].blocks.push(id);

        // bounded by the home method's block numbers
        let mut cur = Some(enclosing);
        while let Some(sid) = cur {
            let scope = &mut self.scopes[sid.index()];
            scope.nested_block_count += 1;
            cur = scope.enclosing;
        }
        Ok(id)
    }

    /// Declare an argument or local and return its slot.
    pub fn add_variable(
        &mut self,
        scope: ScopeId,
        name: &str,
        kind: VariableKind,
        span: Span,
    ) -> Result<u16, DeclareError> {
        let scope = &mut self.scopes[scope.index()];
        if scope.lookup(name).is_some() {
            return Err(DeclareError::Duplicate);
        }
        let index = match u16::try_from(scope.symbols.len()) {
            Ok(index) if index < u16::MAX => index,
            _ => return Err(DeclareError::TooMany),
        };
        scope.symbols.push(VariableSymbol {
            name: name.to_string(),
            kind,
            index,
            span,
        });
        Ok(index)
    }

    /// Bind every class's superclass name to a class in the table. Names
    /// that stay unbound are reported later, when field layout needs them.
    pub fn bind_superclasses(&mut self) {
        for i in 0..self.classes.len() {
            if self.classes[i].superclass.is_some() {
                continue;
            }
            let bound = self.classes[i]
                .superclass_name
                .as_deref()
                .and_then(|name| self.globals.get(name).copied());
            self.classes[i].superclass = bound;
        }
    }

    /// Assign class-wide field indices: a subclass's own fields start at its
    /// superclass's total field count. Returns one entry per class whose
    /// superclass could not be used, as `(class, cause)`.
    pub fn layout_fields(&mut self) -> Vec<(ClassId, LayoutIssue)> {
        let mut issues = Vec::new();
        for i in 0..self.classes.len() {
            self.layout_class(ClassId(i as u32), &mut issues);
        }
        issues
    }

    fn layout_class(&mut self, id: ClassId, issues: &mut Vec<(ClassId, LayoutIssue)>) {
        match self.classes[id.index()].layout {
            Layout::Done => return,
            Layout::InProgress => {
                issues.push((id, LayoutIssue::Cycle));
                return;
            }
            Layout::Pending => {}
        }
        self.classes[id.index()].layout = Layout::InProgress;

        let class = &self.classes[id.index()];
        let mut inherited = match (class.superclass, class.superclass_name.is_some()) {
            (Some(super_id), _) => {
                self.layout_class(super_id, issues);
                let on_cycle = issues.iter().any(|&(c, i)| c == id && i == LayoutIssue::Cycle);
                if on_cycle {
                    // the walk came back around to `id`
                    0
                } else if self.classes[super_id.index()].layout == Layout::Done {
                    self.classes[super_id.index()].field_count()
                } else {
                    // still in progress: `id` sits on a superclass cycle
                    issues.push((id, LayoutIssue::Cycle));
                    0
                }
            }
            (None, true) => {
                issues.push((id, LayoutIssue::UnknownSuperclass));
                0
            }
            (None, false) => 0,
        };

        let class = &mut self.classes[id.index()];
        if usize::from(inherited) + class.fields.len() > MAX_SLOTS {
            issues.push((id, LayoutIssue::TooManyFields));
            inherited = 0;
        }
        class.inherited_fields = inherited;
        for (field, index) in class.fields.iter_mut().zip(inherited..) {
            field.index = Some(index);
        }
        class.layout = Layout::Done;
    }

    // ── Lookup ──────────────────────────────────────────────────

    pub fn class(&self, id: ClassId) -> &ClassSymbol {
        &self.classes[id.index()]
    }

    pub fn class_mut(&mut self, id: ClassId) -> &mut ClassSymbol {
        &mut self.classes[id.index()]
    }

    pub fn classes(&self) -> impl Iterator<Item = (ClassId, &ClassSymbol)> {
        self.classes
            .iter()
            .enumerate()
            .map(|(i, c)| (ClassId(i as u32), c))
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.index()]
    }

    pub fn scope_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.scopes[id.index()]
    }

    pub fn lookup_class(&self, name: &str) -> Option<ClassId> {
        self.globals.get(name).copied()
    }

    pub fn lookup_method(&self, class: ClassId, selector: &str) -> Option<ScopeId> {
        self.classes[class.index()]
            .methods
            .iter()
            .copied()
            .find(|&m| matches!(&self.scope(m).kind, ScopeKind::Method { selector: s, .. } if s == selector))
    }

    /// Superclass chain of `class`, nearest first, stopping at a cycle.
    pub fn ancestors(&self, class: ClassId) -> impl Iterator<Item = ClassId> + '_ {
        let mut cur = self.class(class).superclass;
        let mut remaining = self.classes.len();
        std::iter::from_fn(move || {
            let id = cur?;
            if remaining == 0 {
                return None;
            }
            remaining -= 1;
            cur = self.class(id).superclass;
            Some(id)
        })
    }

    /// Field slot of `name` as seen from `class`, searching own fields and
    /// then each superclass.
    pub fn field_index(&self, class: ClassId, name: &str) -> Option<u16> {
        std::iter::once(class)
            .chain(self.ancestors(class))
            .find_map(|c| self.class(c).own_field(name))
            .and_then(|f| f.index)
    }

    /// Classify `name` as referenced from `from`: the scope chain outwards,
    /// then the class's fields (inherited included), else Global.
    pub fn resolve(&self, from: ScopeId, name: &str) -> Binding {
        let mut depth = 0u16;
        let mut cur = Some(from);
        while let Some(id) = cur {
            let scope = self.scope(id);
            if let Some(var) = scope.lookup(name) {
                return match var.kind {
                    VariableKind::Argument => Binding::Argument { depth, index: var.index },
                    VariableKind::Local => Binding::Local { depth, index: var.index },
                };
            }
            depth = depth.saturating_add(1);
            cur = scope.enclosing;
        }
        match self.field_index(self.scope(from).class, name) {
            Some(index) => Binding::Field { index },
            None => Binding::Global,
        }
    }

    /// `Class>>selector` for methods, `Class>>selector-blockN` for blocks.
    pub fn qualified_name(&self, scope: ScopeId) -> String {
        let s = self.scope(scope);
        let class = &self.class(s.class).name;
        format!("{}>>{}", class, self.scope_name(scope))
    }

    /// Unqualified scope name: the selector, or `selector-blockN`.
    pub fn scope_name(&self, scope: ScopeId) -> String {
        let s = self.scope(scope);
        let selector = match &self.scope(s.method).kind {
            ScopeKind::Method { selector, .. } => selector.as_str(),
            ScopeKind::Block { .. } => "?",
        };
        match s.kind {
            ScopeKind::Method { .. } => selector.to_string(),
            ScopeKind::Block { index } => format!("{selector}-block{index}"),
        }
    }
}

/// Why a class's fields could not build on its superclass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutIssue {
    UnknownSuperclass,
    Cycle,
    /// Inherited plus own fields exceed [`MAX_SLOTS`].
    TooManyFields,
}

/// Why a field, variable or block could not be declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclareError {
    /// The name is already declared in the same class or scope.
    Duplicate,
    /// No slot or block number is left.
    TooMany,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_with_class(name: &str, superclass: Option<&str>, fields: &[&str]) -> (SymbolTable, ClassId) {
        let mut table = SymbolTable::new();
        let id = table.add_class(name, superclass, Span::default());
        for f in fields {
            table.add_field(id, f, Span::default()).expect("field");
        }
        (table, id)
    }

    #[test]
    fn string_table_dedups_in_insertion_order() {
        let mut t = StringTable::new();
        assert_eq!(t.add("at:put:"), 0);
        assert_eq!(t.add("hello"), 1);
        assert_eq!(t.add("at:put:"), 0);
        assert_eq!(t.add("+"), 2);
        assert_eq!(t.as_slice(), &["at:put:", "hello", "+"]);
        assert_eq!(t.get("hello"), Some(1));
        assert_eq!(t.get("nope"), None);
    }

    #[test]
    fn root_class_is_predefined() {
        let table = SymbolTable::new();
        let object = table.lookup_class(ROOT_CLASS).expect("root");
        assert!(table.class(object).builtin);
        assert_eq!(table.class(object).field_count(), 0);
    }

    #[test]
    fn subclass_fields_start_after_superclass_fields() {
        let mut table = SymbolTable::new();
        // subclass defined before its superclass
        let b = table.add_class("B", Some("A"), Span::default());
        table.add_field(b, "c", Span::default()).expect("field");
        table.add_field(b, "d", Span::default()).expect("field");
        let a = table.add_class("A", Some(ROOT_CLASS), Span::default());
        table.add_field(a, "x", Span::default()).expect("field");
        table.add_field(a, "y", Span::default()).expect("field");

        table.bind_superclasses();
        assert!(table.layout_fields().is_empty());

        assert_eq!(table.field_index(a, "x"), Some(0));
        assert_eq!(table.field_index(a, "y"), Some(1));
        assert_eq!(table.field_index(b, "c"), Some(2));
        assert_eq!(table.field_index(b, "d"), Some(3));
        assert_eq!(table.field_index(b, "x"), Some(0));
        assert_eq!(table.class(b).field_count(), 4);
    }

    #[test]
    fn builtin_classes_extend_layout() {
        let mut table = SymbolTable::new();
        table
            .define_builtin_class("Point", Some(ROOT_CLASS), &["x", "y"])
            .expect("defined");
        assert!(table.define_builtin_class("Point", None, &[]).is_none());
        assert!(table.define_builtin_class("Q", Some("Missing"), &[]).is_none());

        let p3 = table.add_class("Point3D", Some("Point"), Span::default());
        table.add_field(p3, "z", Span::default()).expect("field");
        table.bind_superclasses();
        assert!(table.layout_fields().is_empty());
        assert_eq!(table.field_index(p3, "z"), Some(2));
    }

    #[test]
    fn unknown_superclass_is_reported_by_layout() {
        let (mut table, id) = table_with_class("A", Some("Nowhere"), &["f"]);
        table.bind_superclasses();
        let issues = table.layout_fields();
        assert_eq!(issues, vec![(id, LayoutIssue::UnknownSuperclass)]);
        assert_eq!(table.field_index(id, "f"), Some(0));
    }

    #[test]
    fn superclass_cycle_is_reported() {
        let mut table = SymbolTable::new();
        let a = table.add_class("A", Some("B"), Span::default());
        let b = table.add_class("B", Some("A"), Span::default());
        table.add_field(a, "f", Span::default()).expect("field");
        table.add_field(b, "g", Span::default()).expect("field");
        table.bind_superclasses();
        let issues = table.layout_fields();
        assert_eq!(issues.len(), 2);
        assert!(issues.iter().all(|&(c, i)| (c == a || c == b) && i == LayoutIssue::Cycle));
        // both classes on the cycle start their fields at 0
        assert_eq!(table.field_index(a, "f"), Some(0));
        assert_eq!(table.field_index(b, "g"), Some(0));
        assert_eq!(table.class(a).field_count(), 1);
        // lookups still terminate
        assert_eq!(table.field_index(b, "missing"), None);
        assert_eq!(table.ancestors(a).count(), 3);
    }

    #[test]
    fn duplicate_field_is_rejected() {
        let (mut table, id) = table_with_class("A", None, &["f"]);
        assert_eq!(table.add_field(id, "f", Span::default()), Err(DeclareError::Duplicate));
        assert_eq!(table.class(id).fields.len(), 1);
    }

    #[test]
    fn block_numbers_are_per_method() {
        let (mut table, class) = table_with_class("A", None, &[]);
        let m1 = table.add_method(class, "foo", None);
        let b0 = table.add_block(m1).expect("block");
        let b1 = table.add_block(b0).expect("block");
        let b2 = table.add_block(m1).expect("block");
        let m2 = table.add_method(class, "bar", None);
        let c0 = table.add_block(m2).expect("block");

        assert_eq!(table.scope(b0).block_index(), Some(0));
        assert_eq!(table.scope(b1).block_index(), Some(1));
        assert_eq!(table.scope(b2).block_index(), Some(2));
        assert_eq!(table.scope(c0).block_index(), Some(0));

        assert_eq!(table.scope(m1).nested_block_count, 3);
        assert_eq!(table.scope(b0).nested_block_count, 1);
        assert_eq!(table.scope(m1).blocks, vec![b0, b2]);
        assert_eq!(table.scope(b1).method, m1);
        assert_eq!(table.qualified_name(b1), "A>>foo-block1");
    }

    #[test]
    fn arguments_then_locals_share_slots() {
        let (mut table, class) = table_with_class("A", None, &[]);
        let m = table.add_method(class, "at:put:", None);
        assert_eq!(table.add_variable(m, "x", VariableKind::Argument, Span::default()), Ok(0));
        assert_eq!(table.add_variable(m, "y", VariableKind::Argument, Span::default()), Ok(1));
        assert_eq!(table.add_variable(m, "a", VariableKind::Local, Span::default()), Ok(2));
        assert_eq!(table.add_variable(m, "x", VariableKind::Local, Span::default()), Err(DeclareError::Duplicate));
        assert_eq!(table.scope(m).nargs(), 2);
        assert_eq!(table.scope(m).nlocals(), 1);
    }

    #[test]
    fn resolve_walks_scopes_then_fields_then_globals() {
        let (mut table, class) = table_with_class("A", Some(ROOT_CLASS), &["count"]);
        table.bind_superclasses();
        table.layout_fields();
        let m = table.add_method(class, "run:", None);
        table.add_variable(m, "n", VariableKind::Argument, Span::default()).expect("variable");
        let outer = table.add_block(m).expect("block");
        table.add_variable(outer, "t", VariableKind::Local, Span::default()).expect("variable");
        let inner = table.add_block(outer).expect("block");
        table.add_variable(inner, "x", VariableKind::Argument, Span::default()).expect("variable");

        assert_eq!(table.resolve(inner, "x"), Binding::Argument { depth: 0, index: 0 });
        assert_eq!(table.resolve(inner, "t"), Binding::Local { depth: 1, index: 0 });
        assert_eq!(table.resolve(inner, "n"), Binding::Argument { depth: 2, index: 0 });
        assert_eq!(table.resolve(inner, "count"), Binding::Field { index: 0 });
        assert_eq!(table.resolve(inner, "Transcript"), Binding::Global);
    }

    #[test]
    fn duplicate_method_is_not_listed_twice() {
        let (mut table, class) = table_with_class("A", None, &[]);
        let first = table.add_method(class, "foo", None);
        let second = table.add_method(class, "foo", None);
        assert_ne!(first, second);
        assert_eq!(table.class(class).methods, vec![first]);
        assert_eq!(table.lookup_method(class, "foo"), Some(first));
    }

    #[test]
    fn self_superclass_is_a_cycle() {
        let (mut table, id) = table_with_class("A", Some("A"), &["f"]);
        table.bind_superclasses();
        assert_eq!(table.layout_fields(), vec![(id, LayoutIssue::Cycle)]);
        assert_eq!(table.field_index(id, "f"), Some(0));
    }

    #[test]
    fn block_numbers_run_out() {
        let (mut table, class) = table_with_class("A", None, &[]);
        let m = table.add_method(class, "m", None);
        for _ in 0..MAX_SLOTS {
            table.add_block(m).expect("block");
        }
        let scopes = table.scopes.len();
        assert_eq!(table.add_block(m), Err(DeclareError::TooMany));
        // a failed declaration leaves no scope behind
        assert_eq!(table.scopes.len(), scopes);
        assert_eq!(table.scope(m).nested_block_count as usize, MAX_SLOTS);
    }

    #[test]
    fn field_slots_run_out() {
        let names: Vec<String> = (0..MAX_SLOTS).map(|i| format!("f{i}")).collect();
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        let mut table = SymbolTable::new();
        let big = table
            .define_builtin_class("Big", Some(ROOT_CLASS), &names)
            .expect("fits exactly");
        assert_eq!(table.class(big).field_count(), u16::MAX);
        assert!(table.define_builtin_class("Bigger", Some("Big"), &["x"]).is_none());

        let sub = table.add_class("Sub", Some("Big"), Span::default());
        table.add_field(sub, "x", Span::default()).expect("field");
        table.bind_superclasses();
        assert_eq!(table.layout_fields(), vec![(sub, LayoutIssue::TooManyFields)]);
        assert_eq!(table.field_index(sub, "x"), Some(0));
    }
}
