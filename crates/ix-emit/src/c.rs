//! The C target emitter.
//!
//! The emitter produces one header file (`<out>/include/<package>.h`)
//! holding the type forward declarations and mangled function
//! signatures, and one implementation file (`<out>/c/<package>.c`)
//! holding the struct layouts, the file-scope class members, and the
//! function bodies.

use std::fs;
use std::path::Path;

use ix_ast::Atom;
use ix_ast::Block;
use ix_ast::Conditional;
use ix_ast::Expression;
use ix_ast::Member;
use ix_ast::Sigil;
use ix_ast::Signature;
use ix_ast::SourceUnit;
use ix_ast::Statement;
use ix_ast::Type;
use ix_ast::UnitCollection;

use super::EmittedFiles;
use super::Error;

/// Emits the collection as C into the output directory.
///
/// `<out>/include` and `<out>/c` are created if missing.
pub fn emit(collection: &UnitCollection, output_dir: &Path) -> Result<EmittedFiles, Error> {
    let generator = Generator::new(collection);

    let include_dir = output_dir.join("include");
    fs::create_dir_all(&include_dir).map_err(|source| Error::CreateDir {
        path: include_dir.clone(),
        source,
    })?;

    let c_dir = output_dir.join("c");
    fs::create_dir_all(&c_dir).map_err(|source| Error::CreateDir {
        path: c_dir.clone(),
        source,
    })?;

    let package = generator.package();

    let header = include_dir.join(format!("{package}.h"));
    tracing::debug!(path = %header.display(), "writing header");
    fs::write(&header, generator.header()).map_err(|source| Error::WriteFile {
        path: header.clone(),
        source,
    })?;

    let implementation = c_dir.join(format!("{package}.c"));
    tracing::debug!(path = %implementation.display(), "writing implementation");
    fs::write(&implementation, generator.implementation()).map_err(|source| Error::WriteFile {
        path: implementation.clone(),
        source,
    })?;

    Ok(EmittedFiles {
        header,
        implementation,
    })
}

/// Generates C header and implementation text from a unit collection.
#[derive(Debug)]
pub struct Generator<'a> {
    /// The collection being emitted.
    collection: &'a UnitCollection,
}

impl<'a> Generator<'a> {
    /// Creates a new generator over the given collection.
    pub fn new(collection: &'a UnitCollection) -> Self {
        Self { collection }
    }

    /// Gets the package the output files are named for.
    ///
    /// This is the package of the first unit in the collection, falling
    /// back to the first unit's name for units without a package.
    pub fn package(&self) -> String {
        match self.collection.units().first() {
            Some(unit) if !unit.package.is_empty() => unit.package.clone(),
            Some(unit) => unit.name.clone(),
            None => String::new(),
        }
    }

    /// Generates the header file text.
    pub fn header(&self) -> String {
        let mut out = String::new();

        let guard = format!("{package}.h", package = self.package())
            .to_uppercase()
            .replace('.', "_");
        out.push_str(&format!("#ifndef {guard}\n#define {guard}\n\n"));

        for line in self.collection.copyright_lines() {
            out.push_str(&format!("// Copyright {line}\n"));
        }
        if !self.collection.copyright_lines().is_empty() {
            out.push('\n');
        }

        for line in self.collection.license_lines() {
            out.push_str(&format!("// License {line}\n"));
        }
        if !self.collection.license_lines().is_empty() {
            out.push('\n');
        }

        out.push_str("#ifndef REF\n#define REF\n#endif\n\n");

        // Forward declarations for every known type, padded so that the
        // typedef names line up.
        let types: Vec<String> = self
            .collection
            .resolved_types()
            .values()
            .map(|full| full.replace('.', "_"))
            .collect();
        let width = types.iter().map(String::len).max().unwrap_or(0);
        for ty in &types {
            let padding = " ".repeat(width - ty.len());
            out.push_str(&format!("typedef struct _{ty}{padding} {ty};\n"));
        }
        if !types.is_empty() {
            out.push('\n');
        }

        for (mangled, unit, signature) in self.collection.signatures() {
            out.push_str(&self.c_type(&signature.return_type));
            out.push('\n');
            out.push_str(mangled);
            out.push('\n');
            out.push_str(&self.parameter_list(&unit.prefix(), signature));
            out.push_str(";\n\n");
        }

        out.push_str("#endif\n");
        out
    }

    /// Generates the implementation file text.
    pub fn implementation(&self) -> String {
        let mut out = String::new();

        out.push_str(&format!(
            "#include \"{package}.h\"\n\n",
            package = self.package()
        ));

        for unit in self.collection.units() {
            self.unit_layout(unit, &mut out);
        }

        for unit in self.collection.units() {
            let prefix = unit.prefix();
            for method in &unit.methods {
                self.method(&prefix, &method.signature, &method.body, &mut out);
            }
        }

        out
    }

    /// Emits the struct layout and file-scope class members of a unit.
    fn unit_layout(&self, unit: &SourceUnit, out: &mut String) {
        let prefix = unit.prefix();

        out.push_str(&format!("struct _{prefix}\n{{\n"));
        if let Some(class) = &unit.class {
            for member in class.members.iter().filter(|m| m.is_instance) {
                out.push_str(&format!(
                    "\t{ty} {name};\n",
                    ty = self.c_type(&member.ty),
                    name = member.name
                ));
            }
        }
        out.push_str("};\n\n");

        if let Some(class) = &unit.class {
            let class_members: Vec<&Member> =
                class.members.iter().filter(|m| !m.is_instance).collect();
            for member in &class_members {
                out.push_str(&format!(
                    "{ty} {prefix}_{name};\n",
                    ty = self.c_type(&member.ty),
                    name = member.name
                ));
            }
            if !class_members.is_empty() {
                out.push('\n');
            }
        }
    }

    /// Emits one method: commentary, signature, and body.
    fn method(&self, prefix: &str, signature: &Signature, body: &Block, out: &mut String) {
        out.push_str(&format!("// {modifier}", modifier = signature.modifier));
        if signature.is_const {
            out.push_str(" const");
        }
        out.push('\n');

        out.push_str(&self.c_type(&signature.return_type));
        out.push('\n');
        out.push_str(&signature.mangled_name(prefix));
        out.push('\n');
        out.push_str(&self.parameter_list(prefix, signature));
        out.push_str("\n{\n");
        self.block(body, prefix, 1, out);
        out.push_str("}\n\n");
    }

    /// Renders the parameter list of a signature.
    ///
    /// Signatures that are not class-scoped receive an implicit
    /// `<unit-type>* self` as the first parameter.
    fn parameter_list(&self, prefix: &str, signature: &Signature) -> String {
        let mut lines = Vec::new();

        if !signature.is_static {
            lines.push(format!("\t{prefix}* self"));
        }

        for parameter in &signature.parameters {
            lines.push(format!(
                "\t{ty} {name}",
                ty = self.c_type(&parameter.ty),
                name = parameter.name
            ));
        }

        if lines.is_empty() {
            "()".to_string()
        } else {
            format!("(\n{lines}\n)", lines = lines.join(",\n"))
        }
    }

    /// Maps a semantic type to its C rendering.
    ///
    /// Short names are resolved against the collection's resolved-types
    /// map; array types lower to pointers, references append the `REF`
    /// marker, and the unsupported pointer-and-array combination emits
    /// the `?` sentinel.
    fn c_type(&self, ty: &Type) -> String {
        let base = if ty.name.is_empty() {
            "void".to_string()
        } else if ty.is_full_name() || ty.is_primitive() {
            ty.name.replace('.', "_")
        } else {
            self.collection.resolve(&ty.name).replace('.', "_")
        };

        let mut out = String::new();
        if ty.is_const {
            out.push_str("const ");
        }
        out.push_str(&base);

        if ty.is_pointer && ty.is_array {
            out.push('?');
        } else if ty.is_pointer || ty.is_array {
            out.push('*');
        }

        if ty.is_reference {
            out.push_str("* REF");
        }

        out
    }

    /// Emits the statements of a block at the given indent level.
    fn block(&self, block: &Block, prefix: &str, indent: usize, out: &mut String) {
        let tabs = "\t".repeat(indent);

        for statement in &block.statements {
            match statement {
                Statement::Declaration(declaration) => {
                    out.push_str(&format!(
                        "{tabs}{ty} {name}",
                        ty = self.c_type(&declaration.ty),
                        name = declaration.name
                    ));
                    if let Some(initializer) = &declaration.initializer {
                        out.push_str(&format!(
                            " = {expr}",
                            expr = self.expression(initializer, prefix)
                        ));
                    }
                    out.push_str(";\n");
                }
                Statement::Expression {
                    is_return,
                    expression,
                } => {
                    out.push_str(&tabs);
                    if *is_return {
                        out.push_str("return");
                        if expression.is_some() {
                            out.push(' ');
                        }
                    }
                    if let Some(expression) = expression {
                        out.push_str(&self.expression(expression, prefix));
                    }
                    out.push_str(";\n");
                }
                Statement::Complex(complex) => {
                    match &complex.conditional {
                        Conditional::If(head) => {
                            out.push_str(&format!(
                                "{tabs}if ( {head} )\n",
                                head = self.optional_expression(head, prefix)
                            ));
                        }
                        Conditional::Else => {
                            out.push_str(&format!("{tabs}else\n"));
                        }
                        Conditional::Or(head) => {
                            out.push_str(&format!(
                                "{tabs}else if ( {head} )\n",
                                head = self.optional_expression(head, prefix)
                            ));
                        }
                        Conditional::For(head) => {
                            out.push_str(&format!(
                                "{tabs}for ( {head} )\n",
                                head = self.optional_expression(head, prefix)
                            ));
                        }
                        Conditional::While(head) => {
                            out.push_str(&format!(
                                "{tabs}while ( {head} )\n",
                                head = self.optional_expression(head, prefix)
                            ));
                        }
                        Conditional::Foreach {
                            variable,
                            iterator,
                            ..
                        } => {
                            // No C iterator protocol exists to target;
                            // the binding is kept as commentary above
                            // the braced body.
                            out.push_str(&format!("{tabs}// foreach {variable} in {iterator}\n"));
                        }
                    }

                    out.push_str(&format!("{tabs}{{\n"));
                    self.block(&complex.block, prefix, indent + 1, out);
                    out.push_str(&format!("{tabs}}}\n"));
                }
                Statement::Unknown => {
                    out.push_str(&format!("{tabs}// Unknown\n"));
                }
            }
        }
    }

    /// Renders an optional expression, defaulting to empty text.
    fn optional_expression(&self, expression: &Option<Expression>, prefix: &str) -> String {
        expression
            .as_ref()
            .map(|e| self.expression(e, prefix))
            .unwrap_or_default()
    }

    /// Translates an expression to C.
    ///
    /// `@x` becomes `self->x` and `%x` becomes `<prefix>_x`; all other
    /// tokens are emitted verbatim.
    fn expression(&self, expression: &Expression, prefix: &str) -> String {
        match expression {
            Expression::Leaf(atom) => self.atom(atom, prefix),
            Expression::Node {
                prefix: prefix_op,
                left,
                infix,
                right,
                postfix,
            } => {
                let mut out = String::new();
                if let Some(op) = prefix_op {
                    out.push_str(op);
                }
                out.push_str(&self.expression(left, prefix));
                if let Some(op) = infix {
                    out.push(' ');
                    out.push_str(op);
                    out.push(' ');
                    if let Some(right) = right {
                        out.push_str(&self.expression(right, prefix));
                    }
                }
                if let Some(op) = postfix {
                    out.push_str(op);
                }
                out
            }
        }
    }

    /// Translates a leaf value to C.
    fn atom(&self, atom: &Atom, prefix: &str) -> String {
        match atom {
            Atom::Literal(text) => text.clone(),
            Atom::Group(inner) => match inner {
                Some(inner) => format!("( {} )", self.expression(inner, prefix)),
                None => "()".to_string(),
            },
            Atom::Name {
                sigil,
                path,
                arguments,
                subscript,
            } => {
                let mut out = String::new();
                let mut segments = path.iter();

                match sigil {
                    Some(Sigil::Instance) => {
                        out.push_str("self->");
                    }
                    Some(Sigil::Class) => {
                        out.push_str(prefix);
                        out.push('_');
                    }
                    None => {}
                }

                if let Some(first) = segments.next() {
                    out.push_str(first);
                }
                for segment in segments {
                    out.push('.');
                    out.push_str(segment);
                }

                if let Some(arguments) = arguments {
                    if arguments.is_empty() {
                        out.push_str("()");
                    } else {
                        let arguments: Vec<String> = arguments
                            .iter()
                            .map(|a| self.expression(a, prefix))
                            .collect();
                        out.push_str(&format!("( {} )", arguments.join(", ")));
                    }
                }

                if let Some(subscript) = subscript {
                    out.push_str(&format!("[{}]", self.expression(subscript, prefix)));
                }

                out
            }
        }
    }
}

#[cfg(test)]
mod test {
    use std::path::Path;

    use ix_grammar::SyntaxTree;
    use pretty_assertions::assert_eq;

    use super::*;

    /// Parses a unit from the given path and source, asserting that it
    /// produced no diagnostics.
    fn unit(path: &str, source: &str) -> SourceUnit {
        let (tree, diagnostics) = SyntaxTree::parse(source);
        assert!(
            diagnostics.is_empty(),
            "unexpected diagnostics: {diagnostics:?}"
        );
        SourceUnit::from_tree(Path::new(path), &tree)
    }

    /// Builds a collection from (path, source) pairs.
    fn collection(sources: &[(&str, &str)]) -> UnitCollection {
        let mut collection = UnitCollection::new();
        for (path, source) in sources {
            collection.add(unit(path, source));
        }
        collection
    }

    #[test]
    fn string_buffer_layout() {
        let collection = collection(&[(
            "source/ix.base/StringBuffer.ix",
            "public class { @data: char[] %count: int }",
        )]);
        let generator = Generator::new(&collection);

        let header = generator.header();
        assert!(
            header.contains("typedef struct _ix_base_StringBuffer ix_base_StringBuffer;\n"),
            "header was:\n{header}"
        );

        let implementation = generator.implementation();
        assert!(
            implementation.contains("struct _ix_base_StringBuffer\n{\n\tchar* data;\n};\n"),
            "implementation was:\n{implementation}"
        );
        assert!(
            implementation.contains("int ix_base_StringBuffer_count;\n"),
            "implementation was:\n{implementation}"
        );
    }

    #[test]
    fn header_preamble() {
        let collection = collection(&[(
            "source/ix.base/Thing.ix",
            "Copyright 2021 X\nLicense MIT\npublic class { }",
        )]);
        let generator = Generator::new(&collection);

        let header = generator.header();
        assert!(header.starts_with("#ifndef IX_BASE_H\n#define IX_BASE_H\n\n"));
        assert!(header.contains("// Copyright 2021 X\n\n"));
        assert!(header.contains("// License MIT\n\n"));
        assert!(header.contains("#ifndef REF\n#define REF\n#endif\n\n"));
        assert!(header.ends_with("#endif\n"));
    }

    #[test]
    fn constructor_signature() {
        let collection = collection(&[(
            "source/ix.base/Thing.ix",
            "public class { }\npublic new( name: string* )\n{\n}\n",
        )]);
        let generator = Generator::new(&collection);

        let header = generator.header();
        assert!(
            header.contains(
                "ix_base_Thing*\nix_base_Thing__new__name\n(\n\tix_base_Thing* self,\n\tstring* name\n);\n"
            ),
            "header was:\n{header}"
        );
    }

    #[test]
    fn getter_signature() {
        let collection = collection(&[(
            "source/ix.base/Thing.ix",
            "public class { }\npublic get( ): string*\n{\n}\n",
        )]);
        let generator = Generator::new(&collection);

        let header = generator.header();
        assert!(
            header.contains("string*\nix_base_Thing__get\n(\n\tix_base_Thing* self\n);\n"),
            "header was:\n{header}"
        );
    }

    #[test]
    fn typedefs_follow_insertion_order() {
        let collection = collection(&[
            ("source/ix.base/String.ix", "public class { }"),
            ("source/ix.base/StringBuffer.ix", "public class { }"),
        ]);
        let generator = Generator::new(&collection);

        let header = generator.header();
        assert!(
            header.contains(
                "typedef struct _ix_base_String       ix_base_String;\ntypedef struct _ix_base_StringBuffer ix_base_StringBuffer;\n"
            ),
            "header was:\n{header}"
        );
    }

    #[test]
    fn short_type_names_resolve() {
        let collection = collection(&[
            ("source/ix.base/String.ix", "public class { }"),
            (
                "source/ix.base/Thing.ix",
                "public class { @text: String* }",
            ),
        ]);
        let generator = Generator::new(&collection);

        let implementation = generator.implementation();
        assert!(
            implementation.contains("\tix_base_String* text;\n"),
            "implementation was:\n{implementation}"
        );
    }

    #[test]
    fn statement_bodies() {
        let collection = collection(&[(
            "source/ix.base/Counter.ix",
            r#"public class { @max: int }
public run( limit: int ): int
{
    var total: int = 0
    @max = limit
    if ( total < limit ) { total++ }
    else { total = limit }
    foreach ( item in items ) { use( item ) }
    return total
}
"#,
        )]);
        let generator = Generator::new(&collection);

        let implementation = generator.implementation();
        assert!(
            implementation.contains("\tint total = 0;\n"),
            "implementation was:\n{implementation}"
        );
        assert!(
            implementation.contains("\tself->max = limit;\n"),
            "implementation was:\n{implementation}"
        );
        assert!(
            implementation.contains("\tif ( total < limit )\n\t{\n\t\ttotal++;\n\t}\n"),
            "implementation was:\n{implementation}"
        );
        assert!(
            implementation.contains("\telse\n\t{\n\t\ttotal = limit;\n\t}\n"),
            "implementation was:\n{implementation}"
        );
        assert!(
            implementation.contains(
                "\t// foreach item in items\n\t{\n\t\tuse( item );\n\t}\n"
            ),
            "implementation was:\n{implementation}"
        );
        assert!(
            implementation.contains("\treturn total;\n"),
            "implementation was:\n{implementation}"
        );
    }

    #[test]
    fn class_member_substitution() {
        let collection = collection(&[(
            "source/ix.base/Counter.ix",
            "public class { %count: int }\npublic bump()\n{\n %count = %count + 1\n}\n",
        )]);
        let generator = Generator::new(&collection);

        let implementation = generator.implementation();
        assert!(
            implementation.contains("\tix_base_Counter_count = ix_base_Counter_count + 1;\n"),
            "implementation was:\n{implementation}"
        );
    }

    #[test]
    fn emit_writes_both_files() {
        let dir = tempfile::tempdir().expect("should create a temporary directory");
        let collection = collection(&[(
            "source/ix.base/Thing.ix",
            "public class { }\npublic get( ): string*\n{\n}\n",
        )]);

        let emitted = emit(&collection, dir.path()).expect("emission should succeed");
        assert_eq!(emitted.header, dir.path().join("include").join("ix.base.h"));
        assert_eq!(emitted.implementation, dir.path().join("c").join("ix.base.c"));

        let header = fs::read_to_string(&emitted.header).expect("header should exist");
        assert!(header.contains("ix_base_Thing__get"));

        let implementation =
            fs::read_to_string(&emitted.implementation).expect("implementation should exist");
        assert!(implementation.starts_with("#include \"ix.base.h\"\n"));
    }
}
