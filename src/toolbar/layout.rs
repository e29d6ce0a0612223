//! Which toolbar controls are visible, as data.
//!
//! Each [`Rule`] names a control, the branch it belongs to and the predicate
//! deciding whether it shows. [`visible_controls`] walks [`RULES`] in order,
//! so the table order is the on-screen order.

/// A toolbar control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    /// Web-search checkbox.
    WebToggle,
    /// Model selector dropdown.
    ModelSelector,
    /// Flexible gap pushing the remaining controls right.
    Spacer,
    /// "Suggest question" action.
    SuggestQuestion,
    /// Image attach action.
    AttachImage,
    /// Overflow menu with randomness, web search and detached.
    Overflow,
    /// Delete action.
    Delete,
}

impl Control {
    /// Whether the control can take focus.
    pub fn focusable(self) -> bool {
        !matches!(self, Control::Spacer)
    }
}

/// An entry of the overflow menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverflowItem {
    /// Randomness slider.
    Randomness,
    /// Web-search checkbox.
    WebToggle,
    /// Detached checkbox.
    DetachedToggle,
}

/// Everything the layout depends on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LayoutInputs {
    /// Detached chat.
    pub detached: bool,
    /// Web search is not disabled by configuration.
    pub web_enabled: bool,
    /// A selected model with a name exists.
    pub has_model: bool,
    /// The selected model accepts images.
    pub accepts_images: bool,
    /// Editable, idle and a remove callback exists.
    pub can_delete: bool,
}

/// Which branch a rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    /// Detached chats only.
    Detached,
    /// Non-detached chats only.
    Attached,
    /// Both.
    Any,
}

impl Branch {
    fn admits(self, detached: bool) -> bool {
        match self {
            Branch::Detached => detached,
            Branch::Attached => !detached,
            Branch::Any => true,
        }
    }
}

/// One row of the layout table.
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    /// Control shown.
    pub control: Control,
    /// Branch it belongs to.
    pub branch: Branch,
    /// Extra condition.
    pub when: fn(&LayoutInputs) -> bool,
}

fn always(_: &LayoutInputs) -> bool {
    true
}

fn web_enabled(i: &LayoutInputs) -> bool {
    i.web_enabled
}

fn has_model(i: &LayoutInputs) -> bool {
    i.has_model
}

fn accepts_images(i: &LayoutInputs) -> bool {
    i.accepts_images
}

fn can_delete(i: &LayoutInputs) -> bool {
    i.can_delete
}

/// The toolbar layout.
pub const RULES: &[Rule] = &[
    Rule {
        control: Control::WebToggle,
        branch: Branch::Detached,
        when: web_enabled,
    },
    Rule {
        control: Control::ModelSelector,
        branch: Branch::Any,
        when: has_model,
    },
    Rule {
        control: Control::Spacer,
        branch: Branch::Detached,
        when: always,
    },
    Rule {
        control: Control::SuggestQuestion,
        branch: Branch::Attached,
        when: always,
    },
    Rule {
        control: Control::AttachImage,
        branch: Branch::Any,
        when: accepts_images,
    },
    Rule {
        control: Control::Overflow,
        branch: Branch::Attached,
        when: always,
    },
    Rule {
        control: Control::Delete,
        branch: Branch::Any,
        when: can_delete,
    },
];

/// Controls shown for `inputs`, left to right.
pub fn visible_controls(inputs: &LayoutInputs) -> Vec<Control> {
    RULES
        .iter()
        .filter(|r| r.branch.admits(inputs.detached) && (r.when)(inputs))
        .map(|r| r.control)
        .collect()
}

/// Entries of the overflow menu, top to bottom.
pub fn overflow_items(inputs: &LayoutInputs) -> Vec<OverflowItem> {
    let mut items = vec![OverflowItem::Randomness];
    if inputs.web_enabled {
        items.push(OverflowItem::WebToggle);
    }
    items.push(OverflowItem::DetachedToggle);
    items
}

/// Dot on the attach control: the item already has images.
pub fn attach_indicator(has_images: bool) -> bool {
    has_images
}

/// Dot on the overflow trigger: a non-default menu setting is active.
pub fn overflow_indicator(use_web: bool, detached: bool) -> bool {
    use_web || detached
}
