//! A zerolog-shaped library declared in a fresh graph, plus helpers for
//! building handler bodies against it.

#![allow(dead_code)]

use ctxprop_check::{analyze, NoSuppression, Report, RoleTable};
use ctxprop_core::{Capture, ConstValue, NodeId, Position, ProcId, Receiver, TypeId, ValueGraph};

pub const ZEROLOG: &str = "github.com/rs/zerolog";
pub const ZEROLOG_LOG: &str = "github.com/rs/zerolog/log";
pub const APP: &str = "example.com/app";
pub const FILE: &str = "handler.go";

pub struct Zerolog {
    pub graph: ValueGraph,
    pub event: TypeId,
    pub logger: TypeId,
    pub logger_ptr: TypeId,
    pub context: TypeId,
    pub marker: TypeId,

    pub info: ProcId,
    pub with: ProcId,
    pub print: ProcId,
    pub msg: ProcId,
    pub send: ProcId,
    pub event_str: ProcId,
    pub event_ctx: ProcId,
    pub context_ctx: ProcId,
    pub context_str: ProcId,
    pub context_logger: ProcId,
    pub zerolog_ctx: ProcId,
    pub log_ctx: ProcId,
    pub log_print: ProcId,
    pub log_info: ProcId,
}

fn recv(name: &str, ty: TypeId) -> Receiver {
    Receiver {
        name: name.into(),
        ty,
    }
}

impl Zerolog {
    pub fn new() -> Self {
        let mut graph = ValueGraph::new();
        let event_named = graph.types.named(ZEROLOG, "Event");
        let event = graph.types.pointer_to(event_named).unwrap();
        let logger = graph.types.named(ZEROLOG, "Logger");
        let logger_ptr = graph.types.pointer_to(logger).unwrap();
        let context = graph.types.named(ZEROLOG, "Context");
        let marker = graph.types.named("context", "Context");
        let s = TypeId::STRING;

        let info = graph.add_method("Info", Some(ZEROLOG), recv("l", logger), vec![], vec![event]);
        let with = graph.add_method("With", Some(ZEROLOG), recv("l", logger), vec![], vec![context]);
        let print = graph.add_method("Print", Some(ZEROLOG), recv("l", logger), vec![("v".into(), s)], vec![]);
        let msg = graph.add_method("Msg", Some(ZEROLOG), recv("e", event), vec![("msg".into(), s)], vec![]);
        let send = graph.add_method("Send", Some(ZEROLOG), recv("e", event), vec![], vec![]);
        let event_str = graph.add_method(
            "Str",
            Some(ZEROLOG),
            recv("e", event),
            vec![("key".into(), s), ("val".into(), s)],
            vec![event],
        );
        let event_ctx = graph.add_method("Ctx", Some(ZEROLOG), recv("e", event), vec![("ctx".into(), marker)], vec![event]);
        let context_ctx = graph.add_method(
            "Ctx",
            Some(ZEROLOG),
            recv("c", context),
            vec![("ctx".into(), marker)],
            vec![context],
        );
        let context_str = graph.add_method(
            "Str",
            Some(ZEROLOG),
            recv("c", context),
            vec![("key".into(), s), ("val".into(), s)],
            vec![context],
        );
        let context_logger = graph.add_method("Logger", Some(ZEROLOG), recv("c", context), vec![], vec![logger]);
        let zerolog_ctx = graph.add_function("Ctx", Some(ZEROLOG), vec![("ctx".into(), marker)], vec![logger_ptr]);
        let log_ctx = graph.add_function("Ctx", Some(ZEROLOG_LOG), vec![("ctx".into(), marker)], vec![logger_ptr]);
        let log_print = graph.add_function("Print", Some(ZEROLOG_LOG), vec![("v".into(), s)], vec![]);
        let log_info = graph.add_function("Info", Some(ZEROLOG_LOG), vec![], vec![event]);

        Zerolog {
            graph,
            event,
            logger,
            logger_ptr,
            context,
            marker,
            info,
            with,
            print,
            msg,
            send,
            event_str,
            event_ctx,
            context_ctx,
            context_str,
            context_logger,
            zerolog_ctx,
            log_ctx,
            log_print,
            log_info,
        }
    }

    /// `func name(ctx context.Context, log zerolog.Logger)`.
    pub fn handler(&mut self, name: &str) -> Handler {
        let marker = self.marker;
        let logger = self.logger;
        let proc = self.graph.add_function(
            name,
            Some(APP),
            vec![("ctx".into(), marker), ("log".into(), logger)],
            vec![],
        );
        let ctx = self.graph.add_parameter(proc, 0).unwrap();
        let log = self.graph.add_parameter(proc, 1).unwrap();
        Handler { proc, ctx, log }
    }

    /// `func name(log zerolog.Logger)`: no marker in scope.
    pub fn unbound_handler(&mut self, name: &str) -> Handler {
        let logger = self.logger;
        let proc = self
            .graph
            .add_function(name, Some(APP), vec![("log".into(), logger)], vec![]);
        let log = self.graph.add_parameter(proc, 0).unwrap();
        Handler { proc, ctx: log, log }
    }

    pub fn call(&mut self, owner: ProcId, callee: ProcId, args: &[NodeId]) -> NodeId {
        self.graph.add_call(owner, callee, args).unwrap()
    }

    pub fn text(&mut self, owner: ProcId, value: &str) -> NodeId {
        self.graph
            .add_const(owner, ConstValue::Str(value.into()), Some(TypeId::STRING))
            .unwrap()
    }

    /// `log.Info()`.
    pub fn info_on(&mut self, owner: ProcId, log: NodeId) -> NodeId {
        self.call(owner, self.info, &[log])
    }

    /// `event.Ctx(ctx)`.
    pub fn with_ctx(&mut self, owner: ProcId, event: NodeId, ctx: NodeId) -> NodeId {
        self.call(owner, self.event_ctx, &[event, ctx])
    }

    /// `event.Msg("x")` at `line`.
    pub fn msg_at(&mut self, owner: ProcId, event: NodeId, line: u32) -> NodeId {
        let text = self.text(owner, "x");
        let call = self.call(owner, self.msg, &[event, text]);
        self.at(call, line);
        call
    }

    pub fn at(&mut self, node: NodeId, line: u32) {
        self.graph.set_position(node, Position::new(FILE, line, 2)).unwrap();
    }

    /// A closure nested in `parent` capturing `captures` by type.
    pub fn closure(&mut self, parent: ProcId, name: &str, results: Vec<TypeId>, captures: &[TypeId]) -> ProcId {
        let captures = captures
            .iter()
            .enumerate()
            .map(|(i, ty)| Capture {
                name: format!("c{}", i),
                captured_type: *ty,
            })
            .collect();
        self.graph.add_closure(name, parent, vec![], results, captures).unwrap()
    }

    pub fn analyze(&self) -> Report {
        let table = RoleTable::default();
        analyze(&self.graph, &table, &mut NoSuppression)
    }
}

/// A handler procedure with its parameter values.
#[derive(Debug, Clone, Copy)]
pub struct Handler {
    pub proc: ProcId,
    pub ctx: NodeId,
    pub log: NodeId,
}

pub fn lines(report: &Report) -> Vec<u32> {
    report
        .findings()
        .iter()
        .filter_map(|f| f.position.as_ref().map(|p| p.line))
        .collect()
}
