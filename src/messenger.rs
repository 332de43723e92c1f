use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// Script output, posted by `Sys.print`.
    Stdout,
    /// Interpreter diagnostics, posted only in debug mode.
    Debug,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub kind: MessageKind,
    /// Who posted the message, e.g. `print`.
    pub identifier: String,
    pub data: String,
}

impl Message {
    pub fn new(kind: MessageKind, identifier: impl Into<String>, data: impl Into<String>) -> Self {
        Self { kind, identifier: identifier.into(), data: data.into() }
    }
}

pub type Handler = Box<dyn Fn(&Message)>;

/// Publish/subscribe channel between the interpreter and its host.
#[derive(Default)]
pub struct Messenger {
    handlers: HashMap<MessageKind, Vec<Handler>>,
}

impl Messenger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, kind: MessageKind, handler: impl Fn(&Message) + 'static) {
        self.handlers.entry(kind).or_default().push(Box::new(handler));
    }

    pub fn post(&self, message: Message) {
        if let Some(handlers) = self.handlers.get(&message.kind) {
            handlers.iter().for_each(|handler| handler(&message));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    #[test]
    fn only_subscribers_of_the_kind_receive() {
        let received = Rc::new(RefCell::new(vec![]));
        let mut messenger = Messenger::new();

        let sink = received.clone();
        messenger.subscribe(MessageKind::Stdout, move |m| sink.borrow_mut().push(m.data.clone()));

        messenger.post(Message::new(MessageKind::Stdout, "print", "hello"));
        messenger.post(Message::new(MessageKind::Debug, "program", "ignored"));

        assert_eq!(*received.borrow(), vec!["hello".to_owned()]);
    }
}
