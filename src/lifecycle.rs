/*
 * Uniform creation and teardown protocol for every native window kind.
 *
 * A concrete window supplies the `WindowProcedure` capabilities
 * (before/after creation hooks, a message router, close and destroy
 * handlers) and embeds a `BaseWindow` for the shared bookkeeping.
 * `initialize` drives the sequence: run the pre-creation hook, register the
 * class once, create the window with the owning object passed as creation
 * context, then run the post-creation hook. Every failure is logged and
 * reported as `false`; nothing propagates past `initialize`.
 *
 * The OS side is reached through `NativeWindowing`, implemented for Win32 in
 * `window_common` and by a recording fake in the tests below.
 */
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::error::{AppError, AppResult};
use crate::types::{WindowHandle, WindowMessage, wm};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassBackground {
    Window,
    ButtonFace,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowClass {
    pub name: String,
    pub redraw_on_resize: bool,
    pub background: ClassBackground,
}

impl WindowClass {
    pub fn new(name: impl Into<String>) -> Self {
        WindowClass {
            name: name.into(),
            redraw_on_resize: false,
            background: ClassBackground::Window,
        }
    }

    pub fn redraw_on_resize(mut self) -> Self {
        self.redraw_on_resize = true;
        self
    }

    pub fn with_background(mut self, background: ClassBackground) -> Self {
        self.background = background;
        self
    }
}

/// Style family of a window; the platform maps each to concrete style bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowKind {
    /// Never shown; exists only to receive messages.
    Hidden,
    /// Resizable top-level frame with caption and system menu.
    Overlapped,
    /// Fixed-size owned popup with a caption, used for modal prompts.
    ModalDialog,
}

/*
 * Parameters consumed exactly once, at creation. `None` positions and sizes
 * let the platform choose.
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateParams {
    pub title: String,
    pub kind: WindowKind,
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub owner: Option<WindowHandle>,
}

impl CreateParams {
    pub fn new(title: impl Into<String>, kind: WindowKind) -> Self {
        CreateParams {
            title: title.into(),
            kind,
            x: None,
            y: None,
            width: None,
            height: None,
            owner: None,
        }
    }

    pub fn with_size(mut self, width: i32, height: i32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn with_position(mut self, x: i32, y: i32) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self
    }

    pub fn owned_by(mut self, owner: WindowHandle) -> Self {
        self.owner = Some(owner);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowConfig {
    pub class: WindowClass,
    pub params: CreateParams,
}

impl WindowConfig {
    fn validate(&self) -> AppResult<()> {
        if self.class.name.trim().is_empty() {
            return Err(AppError::app(
                "Window class name must be set before window creation",
            ));
        }
        Ok(())
    }
}

pub trait NativeWindowing {
    fn is_class_registered(&self, class_name: &str) -> bool;

    fn register_class(&self, class: &WindowClass) -> AppResult<()>;

    /*
     * Creates the window and binds `owner` to it (via `dispatch::bind`)
     * before the window's own creation messages are routed.
     */
    fn create_window(
        &self,
        class: &WindowClass,
        params: &CreateParams,
        owner: Rc<dyn WindowProcedure>,
    ) -> AppResult<WindowHandle>;

    fn destroy_window(&self, handle: WindowHandle) -> AppResult<()>;

    fn default_procedure(&self, msg: &WindowMessage) -> isize;

    fn post_quit(&self, exit_code: i32);
}

/*
 * Capability interface a concrete window kind supplies. Only `base` and
 * `before_create` are mandatory; the rest default to the baseline behaviour
 * and overriding implementations are expected to fall back to it for
 * messages they do not handle.
 */
pub trait WindowProcedure {
    fn base(&self) -> &BaseWindow;

    fn before_create(&self, ran_prior: bool) -> AppResult<WindowConfig>;

    fn after_create(&self, _ran_prior: bool) -> AppResult<()> {
        Ok(())
    }

    fn route_message(&self, msg: &WindowMessage) -> isize {
        route_default(self, msg)
    }

    fn on_close(&self, _handle: WindowHandle) {
        if let Err(err) = self.base().destroy() {
            err.log_at(log::Level::Error);
        }
    }

    fn on_destroy(&self) {
        self.base().finish_destroy();
    }
}

/// Baseline routing shared by every window kind.
pub fn route_default<W: WindowProcedure + ?Sized>(window: &W, msg: &WindowMessage) -> isize {
    match msg.id {
        wm::CLOSE => {
            window.on_close(msg.handle);
            0
        }
        wm::DESTROY => {
            window.on_destroy();
            0
        }
        _ => window.base().platform().default_procedure(msg),
    }
}

/*
 * Bookkeeping common to every window object: the platform, the handle while
 * the window is alive, the creation parameters it was built from, and the
 * quit-on-destroy flag that separates the process-owning window from
 * reusable secondary ones.
 */
pub struct BaseWindow {
    platform: Rc<dyn NativeWindowing>,
    quit_on_destroy: Cell<bool>,
    initialized: Cell<bool>,
    handle: Cell<Option<WindowHandle>>,
    params: RefCell<Option<CreateParams>>,
}

impl BaseWindow {
    pub fn new(platform: Rc<dyn NativeWindowing>, quit_on_destroy: bool) -> Self {
        BaseWindow {
            platform,
            quit_on_destroy: Cell::new(quit_on_destroy),
            initialized: Cell::new(false),
            handle: Cell::new(None),
            params: RefCell::new(None),
        }
    }

    pub fn platform(&self) -> &Rc<dyn NativeWindowing> {
        &self.platform
    }

    pub fn handle(&self) -> Option<WindowHandle> {
        self.handle.get()
    }

    pub fn is_created(&self) -> bool {
        self.handle.get().is_some()
    }

    pub fn title(&self) -> String {
        self.params
            .borrow()
            .as_ref()
            .map(|p| p.title.clone())
            .unwrap_or_default()
    }

    pub fn quit_on_destroy(&self) -> bool {
        self.quit_on_destroy.get()
    }

    pub fn set_quit_on_destroy(&self, quit: bool) {
        self.quit_on_destroy.set(quit);
    }

    pub(crate) fn attach(&self, handle: WindowHandle) {
        self.handle.set(Some(handle));
    }

    pub fn destroy(&self) -> AppResult<()> {
        match self.handle.get() {
            Some(handle) => self.platform.destroy_window(handle),
            None => Ok(()),
        }
    }

    /*
     * Destruction hook: clears every cached field and, only for the
     * process-owning window, asks the message loop to end.
     */
    pub fn finish_destroy(&self) {
        self.handle.set(None);
        self.params.replace(None);

        if self.quit_on_destroy.get() {
            self.platform.post_quit(0);
        }
    }

    fn begin_initialize(&self) -> bool {
        self.initialized.replace(true)
    }
}

/*
 * Creates the native window for `window`. Calling it again on the same
 * object is the explicit re-creation case: the hooks receive
 * `ran_prior = true` and the class registration is reused.
 */
pub fn initialize<W: WindowProcedure + 'static>(window: &Rc<W>) -> bool {
    match try_initialize(window) {
        Ok(()) => true,
        Err(err) => {
            err.log_at(log::Level::Error);
            false
        }
    }
}

fn try_initialize<W: WindowProcedure + 'static>(window: &Rc<W>) -> AppResult<()> {
    let base = window.base();
    let ran_prior = base.begin_initialize();

    let config = window.before_create(ran_prior)?;
    config.validate()?;

    let platform = Rc::clone(base.platform());
    if platform.is_class_registered(&config.class.name) {
        log::debug!(
            "Lifecycle: Window class '{}' already registered.",
            config.class.name
        );
    } else {
        platform.register_class(&config.class)?;
        log::debug!(
            "Lifecycle: Window class '{}' registered successfully.",
            config.class.name
        );
    }

    let owner: Rc<dyn WindowProcedure> = window.clone();
    let handle = platform.create_window(&config.class, &config.params, owner)?;
    base.attach(handle);
    base.params.replace(Some(config.params));
    log::debug!(
        "Lifecycle: Created {handle:?} for class '{}' (ran_prior={ran_prior}).",
        config.class.name
    );

    window.after_create(ran_prior)
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::dispatch;
    use std::collections::HashSet;

    /*
     * Recording platform that replays the creation and destruction message
     * sequence through the real dispatch layer.
     */
    #[derive(Default)]
    pub(crate) struct FakePlatform {
        pub registered: RefCell<HashSet<String>>,
        pub register_calls: Cell<usize>,
        pub created: RefCell<Vec<WindowHandle>>,
        pub destroyed: RefCell<Vec<WindowHandle>>,
        pub quit_posted: Cell<Option<i32>>,
        pub skip_binding: Cell<bool>,
        next_handle: Cell<isize>,
    }

    impl FakePlatform {
        pub(crate) fn new() -> Rc<Self> {
            Rc::new(FakePlatform {
                next_handle: Cell::new(0x1000),
                ..Default::default()
            })
        }

        pub(crate) fn send(&self, handle: WindowHandle, id: u32) -> isize {
            let msg = WindowMessage::new(handle, id, 0, 0);
            dispatch::route(&msg, |m| self.default_procedure(m))
        }
    }

    impl NativeWindowing for FakePlatform {
        fn is_class_registered(&self, class_name: &str) -> bool {
            self.registered.borrow().contains(class_name)
        }

        fn register_class(&self, class: &WindowClass) -> AppResult<()> {
            self.register_calls.set(self.register_calls.get() + 1);
            self.registered.borrow_mut().insert(class.name.clone());
            Ok(())
        }

        fn create_window(
            &self,
            _class: &WindowClass,
            _params: &CreateParams,
            owner: Rc<dyn WindowProcedure>,
        ) -> AppResult<WindowHandle> {
            let handle = WindowHandle(self.next_handle.get());
            self.next_handle.set(self.next_handle.get() + 0x10);

            if !self.skip_binding.get() {
                dispatch::bind(handle, &owner)?;
            }
            if self.send(handle, wm::NCCREATE) == 0 {
                self.send(handle, wm::NCDESTROY);
                return Err(AppError::win32("CreateWindowExW", 1400));
            }
            if self.send(handle, wm::CREATE) == -1 {
                self.send(handle, wm::DESTROY);
                self.send(handle, wm::NCDESTROY);
                return Err(AppError::win32("CreateWindowExW", 1400));
            }
            self.created.borrow_mut().push(handle);
            Ok(handle)
        }

        fn destroy_window(&self, handle: WindowHandle) -> AppResult<()> {
            self.destroyed.borrow_mut().push(handle);
            self.send(handle, wm::DESTROY);
            self.send(handle, wm::NCDESTROY);
            Ok(())
        }

        fn default_procedure(&self, msg: &WindowMessage) -> isize {
            // NCCREATE must succeed by default, like DefWindowProc.
            if msg.id == wm::NCCREATE { 1 } else { 0 }
        }

        fn post_quit(&self, exit_code: i32) {
            self.quit_posted.set(Some(exit_code));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::FakePlatform;
    use super::*;
    use crate::dispatch;

    /*
     * Window whose "child state" is a generation number created after the
     * window and cleared on destroy, standing in for menus and controls.
     */
    struct TestWindow {
        base: BaseWindow,
        class_name: String,
        generation: Cell<u32>,
        child_state: Cell<Option<u32>>,
        prior_flags: RefCell<Vec<bool>>,
        fail_after_create: Cell<bool>,
    }

    impl TestWindow {
        fn new(platform: Rc<FakePlatform>, class_name: &str, quit: bool) -> Rc<Self> {
            Rc::new(TestWindow {
                base: BaseWindow::new(platform, quit),
                class_name: class_name.to_string(),
                generation: Cell::new(0),
                child_state: Cell::new(None),
                prior_flags: RefCell::new(Vec::new()),
                fail_after_create: Cell::new(false),
            })
        }
    }

    impl WindowProcedure for TestWindow {
        fn base(&self) -> &BaseWindow {
            &self.base
        }

        fn before_create(&self, ran_prior: bool) -> AppResult<WindowConfig> {
            self.prior_flags.borrow_mut().push(ran_prior);
            if ran_prior {
                if let Some(handle) = self.base.handle() {
                    let quit = self.base.quit_on_destroy();
                    self.base.set_quit_on_destroy(false);
                    self.on_close(handle);
                    self.base.set_quit_on_destroy(quit);
                }
            }
            Ok(WindowConfig {
                class: WindowClass::new(self.class_name.clone()),
                params: CreateParams::new("Test window", WindowKind::Hidden),
            })
        }

        fn after_create(&self, _ran_prior: bool) -> AppResult<()> {
            if self.fail_after_create.get() {
                return Err(AppError::app("after_create failed"));
            }
            self.generation.set(self.generation.get() + 1);
            self.child_state.set(Some(self.generation.get()));
            Ok(())
        }

        fn on_destroy(&self) {
            self.child_state.set(None);
            self.base.finish_destroy();
        }
    }

    #[test]
    fn initialize_twice_reuses_class_and_recreates_child_state() {
        // Arrange
        let platform = FakePlatform::new();
        let window = TestWindow::new(platform.clone(), "TestClassA", true);

        // Act
        assert!(initialize(&window));
        let first = window.base().handle();
        assert!(initialize(&window));
        let second = window.base().handle();

        // Assert
        assert_eq!(platform.register_calls.get(), 1);
        assert_eq!(*window.prior_flags.borrow(), vec![false, true]);
        assert_eq!(platform.destroyed.borrow().as_slice(), &[first.unwrap()]);
        assert_ne!(first, second);
        assert_eq!(window.child_state.get(), Some(2));
        assert_eq!(platform.quit_posted.get(), None);
        assert!(dispatch::lookup(first.unwrap()).is_none());
        assert!(dispatch::lookup(second.unwrap()).is_some());
    }

    #[test]
    fn class_registered_elsewhere_is_not_registered_again() {
        // Arrange
        let platform = FakePlatform::new();
        platform
            .registered
            .borrow_mut()
            .insert("TestClassB".to_string());
        let window = TestWindow::new(platform.clone(), "TestClassB", false);

        // Act
        let ok = initialize(&window);

        // Assert
        assert!(ok);
        assert_eq!(platform.register_calls.get(), 0);
    }

    #[test]
    fn empty_class_name_aborts_before_creation() {
        // Arrange
        let platform = FakePlatform::new();
        let window = TestWindow::new(platform.clone(), "   ", false);

        // Act
        let ok = initialize(&window);

        // Assert
        assert!(!ok);
        assert_eq!(platform.register_calls.get(), 0);
        assert!(platform.created.borrow().is_empty());
        assert!(!window.base().is_created());
    }

    #[test]
    fn failing_after_create_reports_false_but_leaves_window_running() {
        // Arrange
        let platform = FakePlatform::new();
        let window = TestWindow::new(platform.clone(), "TestClassC", false);
        window.fail_after_create.set(true);

        // Act
        let ok = initialize(&window);

        // Assert
        assert!(!ok);
        assert!(window.base().is_created());
        assert!(platform.destroyed.borrow().is_empty());
    }

    #[test]
    fn destroying_quit_on_destroy_window_posts_quit_and_clears_fields() {
        // Arrange
        let platform = FakePlatform::new();
        let window = TestWindow::new(platform.clone(), "TestClassD", true);
        assert!(initialize(&window));
        let handle = window.base().handle().unwrap();

        // Act
        platform.send(handle, wm::CLOSE);

        // Assert
        assert_eq!(platform.quit_posted.get(), Some(0));
        assert!(!window.base().is_created());
        assert_eq!(window.base().title(), "");
        assert_eq!(window.child_state.get(), None);
    }

    #[test]
    fn reusable_window_does_not_post_quit_and_can_be_reopened() {
        // Arrange
        let platform = FakePlatform::new();
        let window = TestWindow::new(platform.clone(), "TestClassE", false);
        assert!(initialize(&window));
        let handle = window.base().handle().unwrap();

        // Act
        platform.send(handle, wm::CLOSE);
        let reopened = initialize(&window);

        // Assert
        assert_eq!(platform.quit_posted.get(), None);
        assert!(reopened);
        assert_eq!(platform.register_calls.get(), 1);
        assert_eq!(window.base().title(), "Test window");
    }
}
