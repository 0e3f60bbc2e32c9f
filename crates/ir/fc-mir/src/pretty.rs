//! MIR-style textual rendering of bodies, places and types.

use std::fmt::{self, Write};

use crate::{
    BinOp, Body, BorrowKind, Constant, Mutability, Operand, Place, Projection, Rvalue,
    StatementKind, TerminatorKind, Ty,
};

impl Body {
    /// Renders a place using source names: `x`, `x.f`, `*p`, `(*p).f`.
    #[must_use]
    pub fn describe_place(&self, place: &Place) -> String {
        let mut out = self.local_name(place.local).to_string();
        for proj in &place.projection {
            out = match proj {
                Projection::Deref => format!("*{out}"),
                Projection::Field(name) if out.starts_with('*') => {
                    format!("({out}).{}", self.interner.resolve(name))
                }
                Projection::Field(name) => format!("{out}.{}", self.interner.resolve(name)),
            };
        }
        out
    }

    /// Renders a type using source names for origins and constructors.
    #[must_use]
    pub fn describe_ty(&self, ty: &Ty) -> String {
        match ty {
            Ty::Unit => "()".to_string(),
            Ty::Bool => "bool".to_string(),
            Ty::Int => "int".to_string(),
            Ty::Ref {
                origin,
                mutability,
                referent,
            } => {
                let origin = self
                    .origins
                    .get(*origin)
                    .map_or_else(|| origin.to_string(), |decl| {
                        format!("'{}", self.interner.resolve(&decl.name))
                    });
                match mutability {
                    Mutability::Not => format!("&{origin} {}", self.describe_ty(referent)),
                    Mutability::Mut => format!("&{origin} mut {}", self.describe_ty(referent)),
                }
            }
            Ty::Adt { name, args } => {
                let args: Vec<_> = args.iter().map(|arg| self.describe_ty(arg)).collect();
                format!("{}<{}>", self.interner.resolve(name), args.join(", "))
            }
            Ty::Struct { name, .. } => self.interner.resolve(name).to_string(),
        }
    }

    fn describe_operand(&self, operand: &Operand) -> String {
        match operand {
            Operand::Copy(place) => format!("copy {}", self.describe_place(place)),
            Operand::Move(place) => format!("move {}", self.describe_place(place)),
            Operand::Const(Constant::Int(value)) => format!("const {value}"),
            Operand::Const(Constant::Bool(value)) => format!("const {value}"),
            Operand::Const(Constant::Unit) => "const ()".to_string(),
        }
    }

    fn describe_operands(&self, operands: &[Operand]) -> String {
        operands
            .iter()
            .map(|operand| self.describe_operand(operand))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn describe_rvalue(&self, rvalue: &Rvalue) -> String {
        match rvalue {
            Rvalue::Use(operand) => self.describe_operand(operand),
            Rvalue::Ref {
                origin,
                kind,
                place,
            } => {
                let mutbl = match kind {
                    BorrowKind::Shared => "",
                    BorrowKind::Mutable => "mut ",
                };
                format!(
                    "&'{} {mutbl}{}",
                    self.origin_name(*origin),
                    self.describe_place(place)
                )
            }
            Rvalue::BinaryOp { op, left, right } => {
                let op = match op {
                    BinOp::Add => "Add",
                    BinOp::Sub => "Sub",
                    BinOp::Eq => "Eq",
                    BinOp::Lt => "Lt",
                };
                format!(
                    "{op}({}, {})",
                    self.describe_operand(left),
                    self.describe_operand(right)
                )
            }
            Rvalue::Aggregate(operands) => format!("({})", self.describe_operands(operands)),
        }
    }

    fn describe_terminator(&self, kind: &TerminatorKind) -> String {
        match kind {
            TerminatorKind::Goto { target } => format!("goto -> {target}"),
            TerminatorKind::SwitchInt { discr, targets } => {
                let targets: Vec<_> = targets.iter().map(ToString::to_string).collect();
                format!(
                    "switchInt({}) -> [{}]",
                    self.describe_operand(discr),
                    targets.join(", ")
                )
            }
            TerminatorKind::Call {
                callee,
                args,
                destination,
                target,
                ..
            } => {
                let target = target.map_or_else(|| "!".to_string(), |bb| bb.to_string());
                format!(
                    "{} = {}({}) -> {target}",
                    self.describe_place(destination),
                    self.interner.resolve(callee),
                    self.describe_operands(args)
                )
            }
            TerminatorKind::Return => "return".to_string(),
            TerminatorKind::Unreachable => "unreachable".to_string(),
        }
    }
}

impl fmt::Display for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "fn {} {{", self.fn_name())?;
        if !self.origins.is_empty() {
            let mut line = String::new();
            for (i, decl) in self.origins.iter().enumerate() {
                if i > 0 {
                    line.push_str(", ");
                }
                write!(line, "'{}", self.interner.resolve(&decl.name))?;
                if decl.is_universal() {
                    line.push_str(" (universal)");
                }
            }
            writeln!(f, "    origins: {line}")?;
        }
        for &(sub, sup) in &self.known_subsets {
            writeln!(
                f,
                "    known: '{}: '{}",
                self.origin_name(sub),
                self.origin_name(sup)
            )?;
        }
        for (local, decl) in self.locals.iter_enumerated() {
            let marker = if self.return_local == Some(local) {
                " // return"
            } else {
                ""
            };
            writeln!(
                f,
                "    let {}: {};{marker}",
                self.local_name(local),
                self.describe_ty(&decl.ty)
            )?;
        }
        for (block, data) in self.basic_blocks.iter_enumerated() {
            writeln!(f)?;
            writeln!(f, "    {block}: {{")?;
            for statement in &data.statements {
                let text = match &statement.kind {
                    StatementKind::Assign(place, rvalue) => format!(
                        "{} = {}",
                        self.describe_place(place),
                        self.describe_rvalue(rvalue)
                    ),
                    StatementKind::StorageDead(local) => {
                        format!("StorageDead({})", self.local_name(*local))
                    }
                    StatementKind::Nop => "nop".to_string(),
                };
                writeln!(f, "        {text};")?;
            }
            writeln!(
                f,
                "        {};",
                self.describe_terminator(&data.terminator.kind)
            )?;
            writeln!(f, "    }}")?;
        }
        writeln!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use expect_test::expect;

    use crate::{BodyBuilder, BorrowKind, Operand, Place, Rvalue, Ty};

    #[test]
    fn test_describe_place_parenthesises_fields_under_deref() {
        let mut b = BodyBuilder::new("f");
        let r = b.origin("r");
        let pair = b.struct_ty("Pair", &[("a", Ty::Int), ("b", Ty::Int)]);
        let p = b.local("p", Ty::shared_ref(r, pair));
        let bb0 = b.block();
        b.ret(bb0);
        let a = b.intern("a");
        let body = b.finish().unwrap();
        assert_eq!(body.describe_place(&Place::from_local(p).deref()), "*p");
        assert_eq!(body.describe_place(&Place::from_local(p).deref().field(a)), "(*p).a");
    }

    #[test]
    fn test_pretty_print_body() {
        let mut b = BodyBuilder::new("push_ref");
        let a = b.universal_origin("a");
        let r0 = b.origin("0");
        let r1 = b.origin("1");
        let x = b.local("x", Ty::Int);
        let vec_ty = b.adt_ty("Vec", vec![Ty::shared_ref(r0, Ty::Int)]);
        let v = b.local("v", vec_ty.clone());
        let p = b.local("p", Ty::mut_ref(r1, vec_ty));
        b.return_local("out", Ty::shared_ref(a, Ty::Int));
        let bb0 = b.block();
        let bb1 = b.block();
        b.assign_const(bb0, x, 0);
        b.borrow(bb0, p, r1, BorrowKind::Mutable, v);
        b.goto(bb0, bb1);
        b.assign(bb1, x, Rvalue::Use(Operand::Copy(x.into())));
        b.storage_dead(bb1, p);
        b.ret(bb1);
        let body = b.finish().unwrap();

        expect![[r#"
            fn push_ref {
                origins: 'a (universal), '0, '1
                let x: int;
                let v: Vec<&'0 int>;
                let p: &'1 mut Vec<&'0 int>;
                let out: &'a int; // return

                bb0: {
                    x = const 0;
                    p = &'1 mut v;
                    goto -> bb1;
                }

                bb1: {
                    x = copy x;
                    StorageDead(p);
                    return;
                }
            }
        "#]]
        .assert_eq(&body.to_string());
    }
}
