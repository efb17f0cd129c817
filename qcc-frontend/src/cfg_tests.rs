//! End-to-end CFG shape tests
//!
//! Each test feeds a small translation unit through the full pipeline and
//! asserts on the produced control-flow graph, instructions and symbol
//! effects rather than on intermediate data.

#[cfg(test)]
mod tests {
    use crate::ir::{BinOp, Cfg, Instruction, Var};
    use crate::{Frontend, Translation};
    use qcc_common::{BlockId, CompilerError, Linkage, Storage, SymbolId};

    fn translate(source: &str) -> Translation {
        match Frontend::translate(source) {
            Ok(translation) => translation,
            Err(err) => panic!("translation failed: {err}"),
        }
    }

    fn translate_err(source: &str) -> CompilerError {
        match Frontend::translate(source) {
            Ok(_) => panic!("expected translation of {source:?} to fail"),
            Err(err) => err,
        }
    }

    fn sym_id(tr: &Translation, name: &str) -> SymbolId {
        tr.symbols
            .iter()
            .find(|(_, s)| s.name == name)
            .map(|(id, _)| id)
            .unwrap_or_else(|| panic!("no symbol named '{name}'"))
    }

    /// Number of plain stores into the named symbol across the whole CFG
    fn stores_to(cfg: &Cfg, sym: SymbolId) -> usize {
        cfg.blocks()
            .iter()
            .flat_map(|b| &b.code)
            .filter(|i| {
                matches!(i, Instruction::Assign { target: Var::Direct { sym: s, .. }, .. } if *s == sym)
            })
            .count()
    }

    /// Block whose code calls the named function
    fn block_calling(tr: &Translation, cfg: &Cfg, name: &str) -> BlockId {
        let target = sym_id(tr, name);
        cfg.blocks()
            .iter()
            .find(|b| {
                b.code.iter().any(|i| {
                    matches!(i, Instruction::Call { func: Var::Direct { sym, .. }, .. } if *sym == target)
                })
            })
            .map(|b| b.id)
            .unwrap_or_else(|| panic!("no block calls '{name}'"))
    }

    fn assert_well_formed(cfg: &Cfg) {
        let mut reachable = cfg.reachable_from(cfg.init_entry());
        reachable.extend(cfg.reachable_from(cfg.body));
        for id in reachable {
            let block = cfg.block(id);
            if block.jump[1].is_some() {
                assert!(
                    block.jump[0].is_some(),
                    "block {id} has a true edge but no false edge"
                );
            }
        }
    }

    // S1: file-scope definition with load-time initialization
    #[test]
    fn test_file_scope_initializer() {
        let tr = translate("int x = 3;");
        assert_eq!(tr.cfgs.len(), 1);
        let cfg = &tr.cfgs[0];
        assert!(cfg.fun.is_none());

        let x = sym_id(&tr, "x");
        let symbol = tr.symbols.symbol(x);
        assert_eq!(symbol.storage, Storage::Definition);
        assert_eq!(symbol.linkage, Linkage::Extern);
        assert_eq!(symbol.depth, 0);

        let init = cfg.block(cfg.init_entry());
        assert_eq!(init.code.len(), 1);
        match &init.code[0] {
            Instruction::Assign {
                target: Var::Direct { sym, .. },
                value,
            } => {
                assert_eq!(*sym, x);
                assert_eq!(value.as_int(), Some(3));
            }
            other => panic!("expected store to x, got {other:?}"),
        }
    }

    // S2: incomplete array completed by its initializer
    #[test]
    fn test_array_initializer_completes_type() {
        let tr = translate("int a[] = {1, 2, 3};");
        let a = sym_id(&tr, "a");
        assert_eq!(tr.types.size_of(tr.symbols.symbol(a).ty), 12);

        let cfg = &tr.cfgs[0];
        let init = cfg.block(cfg.init_entry());
        let offsets: Vec<i64> = init
            .code
            .iter()
            .map(|i| match i {
                Instruction::Assign {
                    target: Var::Direct { sym, offset, .. },
                    ..
                } if *sym == a => *offset,
                other => panic!("expected store to a, got {other:?}"),
            })
            .collect();
        assert_eq!(offsets, vec![0, 4, 8]);
    }

    // S3: function definition with parameter and return
    #[test]
    fn test_function_definition() {
        let tr = translate("int f(int x) { return x + 1; }");
        let cfg = &tr.cfgs[0];
        let f = sym_id(&tr, "f");
        assert_eq!(cfg.fun, Some(f));
        assert_eq!(tr.symbols.symbol(f).storage, Storage::Definition);

        assert_eq!(cfg.params.len(), 1);
        let x = cfg.params[0];
        assert_eq!(tr.symbols.symbol(x).name, "x");
        assert_eq!(tr.symbols.symbol(x).depth, 1);

        let body = cfg.block(cfg.body);
        assert!(matches!(
            &body.code[0],
            Instruction::Binary {
                op: BinOp::Add,
                left: Var::Direct { sym, .. },
                right: Var::Immediate { .. },
                ..
            } if *sym == x
        ));
        assert!(matches!(body.code.last(), Some(Instruction::Return { .. })));
        assert_eq!(body.jump, [None, None]);

        // __func__ is synthesized into the head block
        let head = cfg.block(cfg.init_entry());
        assert!(matches!(
            &head.code[0],
            Instruction::Assign { target: Var::Direct { sym, .. }, .. }
                if tr.symbols.symbol(*sym).name == "__func__"
        ));
    }

    // S4: for loop with a break inside a conditional
    #[test]
    fn test_for_loop_with_break() {
        let tr = translate(
            "void g(int n) { int i; for (i = 0; i < n; i++) { if (i == 5) break; } }",
        );
        let cfg = &tr.cfgs[0];
        let i = sym_id(&tr, "i");
        let n = sym_id(&tr, "n");

        // Entry performs the init store and enters the condition
        let entry = cfg.block(cfg.body);
        assert!(matches!(
            &entry.code[0],
            Instruction::Assign { target: Var::Direct { sym, .. }, value }
                if *sym == i && value.as_int() == Some(0)
        ));
        let cond = entry.jump[0].expect("entry falls into the condition");
        assert_eq!(entry.jump[1], None);

        // Condition: i < n lowered as the swapped n > i, two successors
        let cond_block = cfg.block(cond);
        assert!(matches!(
            &cond_block.code[0],
            Instruction::Binary {
                op: BinOp::Gt,
                left: Var::Direct { sym: l, .. },
                right: Var::Direct { sym: r, .. },
                ..
            } if *l == n && *r == i
        ));
        let next = cond_block.jump[0].expect("false edge leaves the loop");
        let body = cond_block.jump[1].expect("true edge enters the body");
        assert_eq!(cfg.block(next).jump, [None, None]);

        // Body branches on i == 5; the break edge goes straight to next
        let body_block = cfg.block(body);
        assert!(matches!(
            &body_block.code[0],
            Instruction::Binary { op: BinOp::Eq, .. }
        ));
        let after_if = body_block.jump[0].expect("false edge continues the body");
        let then = body_block.jump[1].expect("true edge enters the break");
        assert_eq!(cfg.block(then).jump[0], Some(next));

        // The step block stores i and jumps back to the condition
        let step = cfg.block(after_if).jump[0].expect("body tail enters the step");
        let step_block = cfg.block(step);
        assert_eq!(step_block.jump[0], Some(cond));
        assert!(stores_to(cfg, i) >= 2);

        // The break leaves one orphan behind
        let mut reachable = cfg.reachable_from(cfg.init_entry());
        reachable.extend(cfg.reachable_from(cfg.body));
        assert_eq!(cfg.blocks().len() - reachable.len(), 1);

        assert_well_formed(cfg);
    }

    // S5: switch cascade with fallthrough into default
    #[test]
    fn test_switch_cascade() {
        let tr = translate(
            "void a(void); void b(void); void c(void); \
             void h(int x) { switch (x) { case 1: a(); break; case 2: b(); default: c(); } }",
        );
        let cfg = &tr.cfgs[0];
        let l1 = block_calling(&tr, cfg, "a");
        let l2 = block_calling(&tr, cfg, "b");
        let ldef = block_calling(&tr, cfg, "c");

        // Cascade: x == 1 ? L1 : (x == 2 ? L2 : Ldef)
        let entry = cfg.block(cfg.body);
        let cmp1 = cfg.block(entry.jump[0].expect("entry enters the cascade"));
        assert!(matches!(
            &cmp1.code[0],
            Instruction::Binary { op: BinOp::Eq, left, .. } if left.as_int() == Some(1)
        ));
        assert_eq!(cmp1.jump[1], Some(l1));

        let cmp2 = cfg.block(cmp1.jump[0].expect("cascade falls through"));
        assert!(matches!(
            &cmp2.code[0],
            Instruction::Binary { op: BinOp::Eq, left, .. } if left.as_int() == Some(2)
        ));
        assert_eq!(cmp2.jump[1], Some(l2));
        assert_eq!(cmp2.jump[0], Some(ldef));

        // L1 breaks out, L2 falls through into default, default exits
        let next = cfg.block(ldef).jump[0].expect("default flows out");
        assert_eq!(cfg.block(l1).jump[0], Some(next));
        assert_eq!(cfg.block(l2).jump[0], Some(ldef));
        assert_eq!(cfg.block(next).jump, [None, None]);

        assert_well_formed(cfg);
    }

    // S6: struct tag registration and trailing-member zero fill
    #[test]
    fn test_struct_initializer_zero_fills() {
        let tr = translate("struct S { int a; int b; }; struct S s = {1};");
        assert!(tr.symbols.lookup_tag("S").is_some());

        let s = sym_id(&tr, "s");
        assert_eq!(tr.types.size_of(tr.symbols.symbol(s).ty), 8);

        let cfg = &tr.cfgs[0];
        let init = cfg.block(cfg.init_entry());
        assert_eq!(init.code.len(), 2);
        match (&init.code[0], &init.code[1]) {
            (
                Instruction::Assign {
                    target: Var::Direct { offset: 0, .. },
                    value: first,
                },
                Instruction::Assign {
                    target: Var::Direct { offset: 4, .. },
                    value: second,
                },
            ) => {
                assert_eq!(first.as_int(), Some(1));
                assert_eq!(second.as_int(), Some(0));
            }
            other => panic!("unexpected initializer code {other:?}"),
        }
    }

    #[test]
    fn test_union_initializer_zero_fills_padding() {
        let tr = translate("union u { char tag; long big; }; union u v = {7};");
        let cfg = &tr.cfgs[0];
        let init = cfg.block(cfg.init_entry());
        assert_eq!(init.code.len(), 2);
        // Whole object zeroed first, then the first member stored
        assert!(matches!(
            &init.code[0],
            Instruction::Assign { value, .. } if value.as_int() == Some(0)
        ));
        assert!(matches!(
            &init.code[1],
            Instruction::Assign { target: Var::Direct { offset: 0, .. }, value }
                if value.as_int() == Some(7)
        ));
    }

    #[test]
    fn test_string_literal_completes_array() {
        let tr = translate("char s[] = \"abc\"; char t[10] = \"hi\";");
        let s = sym_id(&tr, "s");
        let t = sym_id(&tr, "t");
        assert_eq!(tr.types.size_of(tr.symbols.symbol(s).ty), 4);
        assert_eq!(tr.types.size_of(tr.symbols.symbol(t).ty), 10);
    }

    #[test]
    fn test_static_local_initializes_at_load_time() {
        let tr = translate("int counter(void) { static int n = 3; return n; }");
        let cfg = &tr.cfgs[0];
        let n = sym_id(&tr, "n");
        assert_eq!(tr.symbols.symbol(n).linkage, Linkage::Intern);

        let head = cfg.block(cfg.init_entry());
        assert!(head.code.iter().any(|i| {
            matches!(i, Instruction::Assign { target: Var::Direct { sym, .. }, value }
                if *sym == n && value.as_int() == Some(3))
        }));
        let body = cfg.block(cfg.body);
        assert!(matches!(body.code.last(), Some(Instruction::Return { .. })));
    }

    #[test]
    fn test_post_increment_single_store() {
        let tr = translate("int f(int x) { return x++; }");
        let cfg = &tr.cfgs[0];
        let x = sym_id(&tr, "x");
        assert_eq!(stores_to(cfg, x), 1);

        // The returned value is the copy taken before the store
        let body = cfg.block(cfg.body);
        let copied = match &body.code[0] {
            Instruction::Assign {
                target: Var::Direct { sym, .. },
                value: Var::Direct { sym: source, .. },
            } => {
                assert_eq!(*source, x);
                *sym
            }
            other => panic!("expected copy of x first, got {other:?}"),
        };
        assert!(matches!(
            body.code.last(),
            Some(Instruction::Return { value: Some(Var::Direct { sym, .. }) }) if *sym == copied
        ));
    }

    #[test]
    fn test_pre_increment_returns_updated_value() {
        let tr = translate("int f(int x) { return ++x; }");
        let cfg = &tr.cfgs[0];
        let x = sym_id(&tr, "x");
        assert_eq!(stores_to(cfg, x), 1);
        let body = cfg.block(cfg.body);
        assert!(matches!(
            body.code.last(),
            Some(Instruction::Return { value: Some(Var::Direct { sym, .. }) }) if *sym == x
        ));
    }

    #[test]
    fn test_immediate_condition_folds_to_single_edge() {
        let tr = translate("int f(void) { if (1) { return 1; } return 0; }");
        let cfg = &tr.cfgs[0];
        let entry = cfg.block(cfg.body);
        assert!(entry.jump[0].is_some());
        assert_eq!(entry.jump[1], None);

        let tr = translate("void g(void) { while (0) ; }");
        let cfg = &tr.cfgs[0];
        let top = cfg.block(cfg.body).jump[0].expect("loop condition entered");
        assert!(cfg.block(top).jump[0].is_some());
        assert_eq!(cfg.block(top).jump[1], None);
    }

    #[test]
    fn test_short_circuit_and_reachability() {
        let tr = translate("int f(int a, int b) { return a && b; }");
        let cfg = &tr.cfgs[0];
        let entry = cfg.block(cfg.body);

        let right = entry.jump[1].expect("true edge enters the right operand");
        let skip = entry.jump[0].expect("false edge short-circuits");
        assert_ne!(right, skip);

        // The right operand is reachable only through the true edge
        for block in cfg.blocks() {
            if block.id != entry.id {
                assert_ne!(block.jump[0], Some(right));
                assert_ne!(block.jump[1], Some(right));
            }
        }
        // The skip path materializes the constant 0
        assert!(matches!(
            &cfg.block(skip).code[0],
            Instruction::Assign { value, .. } if value.as_int() == Some(0)
        ));
        assert_well_formed(cfg);
    }

    #[test]
    fn test_conditional_expression_diamond() {
        let tr = translate("int f(int a) { return a ? 1 : 2; }");
        let cfg = &tr.cfgs[0];
        let entry = cfg.block(cfg.body);
        let t = entry.jump[1].expect("true branch");
        let f = entry.jump[0].expect("false branch");

        let join = cfg.block(t).jump[0].expect("true branch joins");
        assert_eq!(cfg.block(f).jump[0], Some(join));
        assert!(matches!(
            cfg.block(join).code.last(),
            Some(Instruction::Return { .. })
        ));
        assert_well_formed(cfg);
    }

    #[test]
    fn test_do_while_shape() {
        let tr = translate("void f(int n) { do { n = n - 1; } while (n); }");
        let cfg = &tr.cfgs[0];
        let top = cfg.block(cfg.body).jump[0].expect("entry enters the body");
        let cond = cfg.block(top).jump[0].expect("body falls into the condition");
        let cond_block = cfg.block(cond);
        assert_eq!(cond_block.jump[1], Some(top));
        assert!(cond_block.jump[0].is_some());
        assert_well_formed(cfg);
    }

    // Open question 3: no condition means the body is entered exactly once
    #[test]
    fn test_for_without_condition_loops_unconditionally() {
        let tr = translate("void f(int n) { for (; ; n = n + 1) ; }");
        let cfg = &tr.cfgs[0];
        let entry = cfg.block(cfg.body);
        let body = entry.jump[0].expect("entry enters the body");
        assert_eq!(entry.jump[1], None);

        let step = cfg.block(body).jump[0].expect("body enters the step");
        let step_tail = cfg.block(step);
        assert!(!step_tail.code.is_empty());
        assert_eq!(step_tail.jump[0], Some(body));

        let tr = translate("void g(void) { for (;;) ; }");
        let cfg = &tr.cfgs[0];
        let body = cfg.block(cfg.body).jump[0].expect("entry enters the body");
        let step = cfg.block(body).jump[0].expect("body enters the step");
        assert_eq!(cfg.block(step).jump[0], Some(body));
    }

    #[test]
    fn test_scope_balance_after_translation() {
        let tr = translate(
            "int f(int n) { { int a; { int b; b = n; } } while (n) { n = n - 1; } return 0; }",
        );
        assert_eq!(tr.symbols.ident.current_depth(), 0);
        assert_eq!(tr.symbols.tag.current_depth(), 0);
    }

    #[test]
    fn test_enum_constants_are_immediates() {
        let tr = translate("enum color { RED, GREEN = 5, BLUE }; int c = BLUE; int d = RED;");
        // One CFG per initialized object
        assert_eq!(tr.cfgs.len(), 2);
        let values: Vec<Option<i64>> = tr
            .cfgs
            .iter()
            .map(|cfg| match &cfg.block(cfg.init_entry()).code[0] {
                Instruction::Assign { value, .. } => value.as_int(),
                other => panic!("expected assignment, got {other:?}"),
            })
            .collect();
        assert_eq!(values, vec![Some(6), Some(0)]);
    }

    #[test]
    fn test_typedef_and_pointer_declarators() {
        let tr = translate(
            "typedef int myint; myint *p; void (*handler)(int); int g(void) { return *p; }",
        );
        let p = sym_id(&tr, "p");
        assert_eq!(tr.types.to_string(tr.symbols.symbol(p).ty), "* int");
        let handler = sym_id(&tr, "handler");
        assert_eq!(
            tr.types.to_string(tr.symbols.symbol(handler).ty),
            "* (int) -> void"
        );
    }

    #[test]
    fn test_self_referential_struct() {
        let tr = translate("struct node { int value; struct node *next; }; struct node n;");
        let n = sym_id(&tr, "n");
        assert_eq!(tr.types.size_of(tr.symbols.symbol(n).ty), 16);
    }

    #[test]
    fn test_array_dimension_constant_folds() {
        let tr = translate("int a[2 * 4];");
        let a = sym_id(&tr, "a");
        assert_eq!(tr.types.size_of(tr.symbols.symbol(a).ty), 32);
    }

    #[test]
    fn test_vararg_call_param_count() {
        let tr = translate(
            "int printf(char *fmt, ...); int f(void) { return printf(\"%d\", 42); }",
        );
        let cfg = &tr.cfgs[0];
        let params = cfg
            .blocks()
            .iter()
            .flat_map(|b| &b.code)
            .filter(|i| matches!(i, Instruction::Param { .. }))
            .count();
        assert_eq!(params, 2);
    }

    #[test]
    fn test_va_builtins_lower_to_instructions() {
        let tr = translate(
            "void f(int n, ...) { int ap; __builtin_va_start(ap, n); n = __builtin_va_arg(ap, int); }",
        );
        let cfg = &tr.cfgs[0];
        let code: Vec<&Instruction> = cfg.blocks().iter().flat_map(|b| &b.code).collect();
        assert!(code.iter().any(|i| matches!(i, Instruction::VaStart { .. })));
        assert!(code.iter().any(|i| matches!(i, Instruction::VaArg { .. })));
    }

    #[test]
    fn test_cast_emits_conversion() {
        let tr = translate("int f(long v) { return (int) v; }");
        let cfg = &tr.cfgs[0];
        let body = cfg.block(cfg.body);
        assert!(matches!(&body.code[0], Instruction::Cast { .. }));
    }

    #[test]
    fn test_declarations_only_produce_no_cfg() {
        let tr = translate("int x; extern long y; int f(int, int);");
        assert!(tr.cfgs.is_empty());
        assert_eq!(tr.symbols.symbol(sym_id(&tr, "x")).storage, Storage::Tentative);
        assert_eq!(
            tr.symbols.symbol(sym_id(&tr, "y")).storage,
            Storage::Declaration
        );
    }

    #[test]
    fn test_multiple_declarators_share_one_init_cfg() {
        let tr = translate("int x, y = 2, z;");
        assert_eq!(tr.cfgs.len(), 1);
        let cfg = &tr.cfgs[0];
        let init = cfg.block(cfg.init_entry());
        assert_eq!(init.code.len(), 1);
        let y = sym_id(&tr, "y");
        assert!(matches!(
            &init.code[0],
            Instruction::Assign { target: Var::Direct { sym, .. }, .. } if *sym == y
        ));
    }

    #[test]
    fn test_printer_renders_function() {
        let tr = translate("int f(int x) { return x; }");
        let cfg = &tr.cfgs[0];
        let text = crate::CfgPrinter::new(cfg, &tr.symbols, &tr.types).to_string();
        assert!(text.contains("f:"));
        assert!(text.contains("ret"));
    }

    // ---- rejected programs ---------------------------------------------

    #[test]
    fn test_break_outside_loop_rejected() {
        assert!(matches!(
            translate_err("void f(void) { break; }"),
            CompilerError::Semantic { .. }
        ));
        assert!(matches!(
            translate_err("void f(void) { continue; }"),
            CompilerError::Semantic { .. }
        ));
    }

    #[test]
    fn test_stray_case_and_duplicate_default_rejected() {
        assert!(matches!(
            translate_err("void f(void) { case 1: ; }"),
            CompilerError::Semantic { .. }
        ));
        assert!(matches!(
            translate_err("void f(int x) { switch (x) { default: ; default: ; } }"),
            CompilerError::Semantic { .. }
        ));
    }

    #[test]
    fn test_extern_initializer_rejected() {
        assert!(matches!(
            translate_err("extern int x = 1;"),
            CompilerError::Semantic { .. }
        ));
    }

    #[test]
    fn test_undefined_symbol_rejected() {
        assert!(matches!(
            translate_err("int f(void) { return y; }"),
            CompilerError::Symbol { .. }
        ));
    }

    #[test]
    fn test_duplicate_member_rejected() {
        assert!(matches!(
            translate_err("struct s { int a; int a; };"),
            CompilerError::Symbol { .. }
        ));
    }

    #[test]
    fn test_wrong_tag_kind_rejected() {
        assert!(matches!(
            translate_err("struct s { int a; }; union s u;"),
            CompilerError::Type { .. }
        ));
        assert!(matches!(
            translate_err("enum e { A }; struct e x;"),
            CompilerError::Type { .. }
        ));
    }

    #[test]
    fn test_bad_array_dimension_rejected() {
        assert!(matches!(
            translate_err("int a[0];"),
            CompilerError::Type { .. }
        ));
    }

    #[test]
    fn test_call_arity_rejected() {
        assert!(matches!(
            translate_err("int f(int a, int b); int g(void) { return f(1); }"),
            CompilerError::Type { .. }
        ));
        // Extra arguments only pass for variadic callees
        assert!(Frontend::translate("int f(int a); int g(void) { return f(1, 2); }").is_err());
    }

    #[test]
    fn test_duplicate_specifier_rejected() {
        assert!(matches!(
            translate_err("unsigned unsigned x;"),
            CompilerError::Type { .. }
        ));
        assert!(matches!(
            translate_err("long float x;"),
            CompilerError::Type { .. }
        ));
    }

    #[test]
    fn test_sizeof_incomplete_rejected() {
        assert!(matches!(
            translate_err("int x = sizeof(void);"),
            CompilerError::Type { .. }
        ));
        assert!(matches!(
            translate_err("int f(void); int x = sizeof f;"),
            CompilerError::Type { .. }
        ));
    }

    #[test]
    fn test_void_return_value_rejected() {
        assert!(matches!(
            translate_err("void f(void) { return 1; }"),
            CompilerError::Type { .. }
        ));
    }

    #[test]
    fn test_non_constant_case_rejected() {
        assert!(matches!(
            translate_err("void f(int x) { switch (x) { case x: ; } }"),
            CompilerError::Semantic { .. }
        ));
    }

    #[test]
    fn test_assignment_to_rvalue_rejected() {
        assert!(matches!(
            translate_err("void f(int x) { 1 = x; }"),
            CompilerError::Type { .. }
        ));
    }

    #[test]
    fn test_trailing_comma_in_parameter_list_rejected() {
        assert!(matches!(
            translate_err("int f(int a,);"),
            CompilerError::Syntax { .. }
        ));
    }

    #[test]
    fn test_unnamed_parameter_in_definition_rejected() {
        assert!(matches!(
            translate_err("int f(int) { return 0; }"),
            CompilerError::Semantic { .. }
        ));
    }

    #[test]
    fn test_incomplete_local_rejected() {
        assert!(matches!(
            translate_err("struct s; void f(void) { struct s x; }"),
            CompilerError::Type { .. }
        ));
    }

    #[test]
    fn test_function_redefinition_rejected() {
        assert!(matches!(
            translate_err("int f(void) { return 0; } int f(void) { return 1; }"),
            CompilerError::Symbol { .. }
        ));
    }
}
