//! Interaction controller.
//!
//! The [`Controller`] turns pointer, menu and editing [`Event`]s into
//! [`TreeStore`] operations and pushes a fresh [`Scene`] to its [`Renderer`]
//! whenever visible state changes. All drag and context menu state lives
//! here so a single dispatcher can read it.

use log::{debug, trace};

use skilltree_core::{
    geometry::{Point, Size},
    identifier::NodeId,
};

use crate::{
    scene::{NullRenderer, Renderer, Scene},
    tree::{DEFAULT_TITLE, Node, TitleEdit, TreeStore},
};

/// Pointer button reported with a press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

/// Entries of the node context menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    AddChild,
    Remove,
}

/// Input delivered to [`Controller::handle`].
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A button was pressed over a node.
    PointerDown {
        node: NodeId,
        pointer: Point,
        button: PointerButton,
    },
    /// The pointer moved to a canvas position.
    PointerMove { pointer: Point },
    /// The pressed button was released.
    PointerUp,
    /// A click landed on a node or, with `None`, on empty space.
    Click { target: Option<NodeId> },
    /// The context menu was requested for a node at a screen position.
    ContextMenuRequest { node: NodeId, screen: Point },
    /// An entry of the open context menu was chosen.
    MenuAction(MenuAction),
    /// Inline title editing finished with the given text.
    TitleCommitted { node: NodeId, text: String },
    /// The drawing surface changed size.
    Resize { size: Size },
}

/// What [`Controller::handle`] did with an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing changed.
    Ignored,
    /// Visible state changed and the scene was re-rendered.
    Updated,
    NodeAdded(NodeId),
    NodeRemoved(NodeId),
    TitleEdited(TitleEdit),
}

/// An open context menu.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContextMenu {
    node: NodeId,
    screen: Point,
}

impl ContextMenu {
    /// The node the menu acts on.
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Screen position the menu was opened at.
    pub fn screen(&self) -> Point {
        self.screen
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Drag {
    node: NodeId,
    /// Pointer position relative to the node's top-left corner at press time.
    offset: Point,
}

/// Dispatcher for user interactions on a [`TreeStore`].
#[derive(Debug)]
pub struct Controller<R: Renderer = NullRenderer> {
    store: TreeStore,
    renderer: R,
    drag: Option<Drag>,
    menu: Option<ContextMenu>,
}

impl<R: Renderer> Controller<R> {
    /// Create a controller and render the initial scene.
    pub fn new(store: TreeStore, renderer: R) -> Self {
        let mut controller = Self {
            store,
            renderer,
            drag: None,
            menu: None,
        };
        controller.render();
        controller
    }

    pub fn store(&self) -> &TreeStore {
        &self.store
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    /// Consume the controller, returning the store and the renderer.
    pub fn into_parts(self) -> (TreeStore, R) {
        (self.store, self.renderer)
    }

    /// The node currently being dragged, if any.
    pub fn dragged_node(&self) -> Option<NodeId> {
        self.drag.map(|drag| drag.node)
    }

    /// The open context menu, if any.
    pub fn context_menu(&self) -> Option<&ContextMenu> {
        self.menu.as_ref()
    }

    /// Dispatch a single event.
    pub fn handle(&mut self, event: Event) -> Outcome {
        trace!(event:? = event; "Handling event");
        match event {
            Event::PointerDown {
                node,
                pointer,
                button,
            } => self.pointer_down(node, pointer, button),
            Event::PointerMove { pointer } => self.pointer_move(pointer),
            Event::PointerUp => {
                if self.drag.take().is_some() {
                    debug!("Drag finished");
                }
                Outcome::Ignored
            }
            Event::Click { target } => self.click(target),
            Event::ContextMenuRequest { node, screen } => self.open_menu(node, screen),
            Event::MenuAction(action) => self.menu_action(action),
            Event::TitleCommitted { node, text } => {
                let edit = self.store.rename(node, &text);
                if edit != TitleEdit::UnknownNode {
                    self.render();
                }
                Outcome::TitleEdited(edit)
            }
            Event::Resize { size } => {
                self.store.set_canvas(size);
                self.render();
                Outcome::Updated
            }
        }
    }

    /// Add a node and re-render. Cancels any active drag first.
    pub fn add_node(
        &mut self,
        parent: Option<NodeId>,
        title: impl Into<String>,
        position: Option<Point>,
    ) -> NodeId {
        self.cancel_drag();
        let id = self.store.add_node(parent, title, position);
        self.render();
        id
    }

    /// Remove a node and re-render. Cancels any active drag first.
    ///
    /// A context menu opened for the removed node is closed.
    pub fn remove_node(&mut self, id: NodeId) -> Option<Node> {
        self.cancel_drag();
        let removed = self.store.remove_node(id)?;
        if self.menu.is_some_and(|menu| menu.node == id) {
            self.menu = None;
        }
        self.render();
        Some(removed)
    }

    /// Change the selection and re-render.
    pub fn select(&mut self, id: Option<NodeId>) {
        self.store.select_node(id);
        self.render();
    }

    /// Relax the layout and re-render.
    pub fn run_layout(&mut self) {
        self.store.run_layout();
        self.render();
    }

    /// Push the current state to the renderer.
    pub fn render(&mut self) {
        let scene = Scene::from_store(&self.store);
        self.renderer.render(&scene);
    }

    fn cancel_drag(&mut self) {
        if let Some(drag) = self.drag.take() {
            debug!(node_id:% = drag.node; "Drag cancelled by structural change");
        }
    }

    fn pointer_down(&mut self, node: NodeId, pointer: Point, button: PointerButton) -> Outcome {
        if button != PointerButton::Primary {
            return Outcome::Ignored;
        }
        let Some(position) = self.store.node(node).map(Node::position) else {
            return Outcome::Ignored;
        };

        let offset = pointer.sub_point(position);
        debug!(node_id:% = node, offset:? = offset; "Drag started");
        self.drag = Some(Drag { node, offset });
        self.store.select_node(Some(node));
        self.render();
        Outcome::Updated
    }

    fn pointer_move(&mut self, pointer: Point) -> Outcome {
        let Some(drag) = self.drag else {
            return Outcome::Ignored;
        };

        if !self.store.set_position(drag.node, pointer.sub_point(drag.offset)) {
            self.drag = None;
            return Outcome::Ignored;
        }
        self.render();
        Outcome::Updated
    }

    fn click(&mut self, target: Option<NodeId>) -> Outcome {
        let mut changed = false;

        if self.menu.take().is_some() {
            changed = true;
        }

        if let Some(node) = target.filter(|node| self.store.contains(*node)) {
            if self.store.selected() != Some(node) {
                self.store.select_node(Some(node));
                changed = true;
            }
        }

        if changed {
            self.render();
            Outcome::Updated
        } else {
            Outcome::Ignored
        }
    }

    fn open_menu(&mut self, node: NodeId, screen: Point) -> Outcome {
        if !self.store.contains(node) {
            return Outcome::Ignored;
        }

        self.menu = Some(ContextMenu { node, screen });
        self.store.select_node(Some(node));
        self.render();
        Outcome::Updated
    }

    fn menu_action(&mut self, action: MenuAction) -> Outcome {
        let Some(menu) = self.menu.take() else {
            return Outcome::Ignored;
        };

        debug!(node_id:% = menu.node, action:? = action; "Menu action");
        match action {
            MenuAction::AddChild => {
                Outcome::NodeAdded(self.add_node(Some(menu.node), DEFAULT_TITLE, None))
            }
            MenuAction::Remove => match self.remove_node(menu.node) {
                Some(removed) => Outcome::NodeRemoved(removed.id()),
                None => {
                    self.render();
                    Outcome::Updated
                }
            },
        }
    }
}
