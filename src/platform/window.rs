//! Main application window implemented with raw Win32 controls.
//!
//! The window hosts the plot canvas and one row of label, trackbar and edit
//! box per parameter. Every widget forwards its input to the
//! [`PlotController`]; the changes it publishes are queued and written back
//! to the sibling widgets once the controller call has returned.

#![allow(unsafe_op_in_unsafe_fn)]

use std::cell::RefCell;
use std::ffi::c_void;
use std::rc::Rc;
use std::sync::Once;

use tracing::{debug, error, info, warn};
use windows::core::{w, PCWSTR};
use windows::Win32::Foundation::{GetLastError, HINSTANCE, HWND, LPARAM, LRESULT, RECT, WIN32_ERROR, WPARAM};
use windows::Win32::Graphics::Gdi::{
    BeginPaint, CreateFontW, DeleteObject, EndPaint, GetStockObject, GetSysColorBrush, InvalidateRect,
    SetDIBitsToDevice, BITMAPINFO, BITMAPINFOHEADER, BI_RGB, CLIP_DEFAULT_PRECIS, COLOR_BTNFACE,
    DEFAULT_CHARSET, DEFAULT_GUI_FONT, DEFAULT_PITCH, DEFAULT_QUALITY, DIB_RGB_COLORS, FF_DONTCARE,
    FW_NORMAL, HDC, HFONT, HGDIOBJ, OUT_DEFAULT_PRECIS, PAINTSTRUCT,
};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::Controls::*;
use windows::Win32::UI::Input::KeyboardAndMouse::VK_RETURN;
use windows::Win32::UI::WindowsAndMessaging::*;

use crate::app::controller::{ControllerError, PlotController};
use crate::app::state::{InputEvent, ParameterChange};
use crate::config::parameters::{ParameterId, ParameterSpec};
use crate::domain::core::Rect;
use crate::platform::windows::{
    rect_to_win32_rect, set_window_text, win32_rect_to_rect, window_dpi_scale, window_text,
};
use crate::ui::layout::{control_font_height, WindowLayout, INITIAL_CLIENT_HEIGHT, INITIAL_CLIENT_WIDTH};

const ID_SLIDER_BASE: i32 = 100;
const ID_ENTRY_BASE: i32 = 200;
/// Posted by an edit box when Enter is pressed; `wparam` carries its control id
const WM_COMMIT_ENTRY: u32 = WM_APP + 1;
// Matches the Win32 ERROR_CLASS_ALREADY_EXISTS (1410) code.
const CLASS_ALREADY_EXISTS_ERR: WIN32_ERROR = WIN32_ERROR(1410);

#[derive(Debug, thiserror::Error)]
pub enum WindowError {
    #[error("Failed to register main window class")]
    ClassRegistrationFailed,
    #[error("Failed to create main window")]
    WindowCreationFailed,
    #[error("Failed to create {0} control")]
    ControlCreationFailed(&'static str),
    #[error("Windows API error: {0}")]
    Win32Error(String),
}

/// Top-level window owning the controller for its whole lifetime
pub struct MainWindow {
    state: *mut WindowState,
}

impl MainWindow {
    /// Registers the window class and creates the window with all controls
    ///
    /// The client area starts at the initial logical size scaled by
    /// `dpi_scale`.
    pub fn create(mut controller: PlotController, dpi_scale: f32) -> Result<Self, WindowError> {
        ensure_common_controls();

        let pending = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&pending);
        controller.subscribe(move |change: &ParameterChange| sink.borrow_mut().push(*change));

        let state = WindowState {
            hwnd: HWND(0),
            controller,
            rows: Vec::new(),
            pending,
            layout: WindowLayout::compute(Rect::default(), dpi_scale),
            font: create_control_font(dpi_scale),
            font_scale: dpi_scale,
        };
        let state_ptr = Box::into_raw(Box::new(state));

        unsafe {
            if let Err(err) = create_main_window(state_ptr, dpi_scale) {
                let _ = Box::from_raw(state_ptr);
                return Err(err);
            }
        }

        Ok(Self { state: state_ptr })
    }

    pub fn show(&self) {
        unsafe {
            let hwnd = (*self.state).hwnd;
            ShowWindow(hwnd, SW_SHOW);
            let _ = SetForegroundWindow(hwnd);
        }
    }

    /// Pumps messages until the window is closed and returns the exit code
    pub fn run(self) -> Result<i32, WindowError> {
        let mut msg = MSG::default();
        unsafe {
            loop {
                match GetMessageW(&mut msg, None, 0, 0).0 {
                    -1 => {
                        return Err(WindowError::Win32Error(format!(
                            "{:?}",
                            windows::core::Error::from_win32()
                        )));
                    }
                    0 => break,
                    _ => {
                        let hwnd = (*self.state).hwnd;
                        if hwnd.0 == 0 || !IsDialogMessageW(hwnd, &msg).as_bool() {
                            TranslateMessage(&msg);
                            DispatchMessageW(&msg);
                        }
                    }
                }
            }
        }
        info!("main window closed");
        Ok(msg.wParam.0 as i32)
    }
}

impl Drop for MainWindow {
    fn drop(&mut self) {
        unsafe {
            let hwnd = (*self.state).hwnd;
            if hwnd.0 != 0 && IsWindow(hwnd).as_bool() {
                let _ = DestroyWindow(hwnd);
            }
            let state = Box::from_raw(self.state);
            release_font(state.font);
        }
    }
}

struct WindowState {
    hwnd: HWND,
    controller: PlotController,
    rows: Vec<ControlRow>,
    pending: Rc<RefCell<Vec<ParameterChange>>>,
    layout: WindowLayout,
    font: HFONT,
    /// DPI scale `font` was created for
    font_scale: f32,
}

#[derive(Debug, Clone, Copy)]
struct ControlRow {
    id: ParameterId,
    label: HWND,
    slider: HWND,
    entry: HWND,
}

fn ensure_common_controls() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let icc = INITCOMMONCONTROLSEX {
            dwSize: std::mem::size_of::<INITCOMMONCONTROLSEX>() as u32,
            dwICC: ICC_BAR_CLASSES | ICC_STANDARD_CLASSES,
        };
        unsafe {
            InitCommonControlsEx(&icc);
        }
    });
}

fn create_main_window(state_ptr: *mut WindowState, dpi_scale: f32) -> Result<(), WindowError> {
    unsafe {
        let module = GetModuleHandleW(PCWSTR::null())
            .map_err(|e| WindowError::Win32Error(format!("{:?}", e)))?;
        let instance: HINSTANCE = module.into();

        register_window_class(instance)?;

        let style = WS_OVERLAPPEDWINDOW | WS_CLIPCHILDREN;
        let ex_style = WS_EX_CONTROLPARENT;
        let mut frame = RECT {
            left: 0,
            top: 0,
            right: (INITIAL_CLIENT_WIDTH as f32 * dpi_scale).round() as i32,
            bottom: (INITIAL_CLIENT_HEIGHT as f32 * dpi_scale).round() as i32,
        };
        AdjustWindowRectEx(&mut frame, style, false, ex_style)
            .map_err(|e| WindowError::Win32Error(format!("{:?}", e)))?;

        let hwnd = CreateWindowExW(
            ex_style,
            w!("RooflineExplorerWindow"),
            w!("Energy Roofline Model"),
            style,
            CW_USEDEFAULT,
            CW_USEDEFAULT,
            frame.right - frame.left,
            frame.bottom - frame.top,
            None,
            None,
            instance,
            Some(state_ptr as *const c_void),
        );

        if hwnd.0 == 0 {
            return Err(WindowError::WindowCreationFailed);
        }

        (*state_ptr).hwnd = hwnd;
        Ok(())
    }
}

fn register_window_class(instance: HINSTANCE) -> Result<(), WindowError> {
    unsafe {
        let wnd_class = WNDCLASSW {
            style: CS_HREDRAW | CS_VREDRAW,
            lpfnWndProc: Some(main_wnd_proc),
            hInstance: instance,
            hCursor: LoadCursorW(None, IDC_ARROW).unwrap_or_default(),
            hbrBackground: GetSysColorBrush(COLOR_BTNFACE),
            lpszClassName: w!("RooflineExplorerWindow"),
            ..Default::default()
        };

        if RegisterClassW(&wnd_class) == 0 {
            match GetLastError() {
                Err(err) if err.code() == CLASS_ALREADY_EXISTS_ERR.to_hresult() => {}
                _ => return Err(WindowError::ClassRegistrationFailed),
            }
        }
    }

    Ok(())
}

unsafe extern "system" fn main_wnd_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    match msg {
        WM_CREATE => {
            let createstruct = &*(lparam.0 as *const CREATESTRUCTW);
            SetWindowLongPtrW(hwnd, GWLP_USERDATA, createstruct.lpCreateParams as isize);
            if let Some(state) = window_state_mut(hwnd) {
                state.hwnd = hwnd;
                if let Err(err) = state.build_controls() {
                    error!(%err, "failed to build window controls");
                    return LRESULT(-1);
                }
            }
            LRESULT(0)
        }
        WM_SIZE => {
            if let Some(state) = window_state_mut(hwnd) {
                state.relayout();
            }
            LRESULT(0)
        }
        WM_DPICHANGED => {
            let suggested = &*(lparam.0 as *const RECT);
            let _ = SetWindowPos(
                hwnd,
                HWND(0),
                suggested.left,
                suggested.top,
                suggested.right - suggested.left,
                suggested.bottom - suggested.top,
                SWP_NOZORDER | SWP_NOACTIVATE,
            );
            LRESULT(0)
        }
        WM_HSCROLL => {
            if let Some(state) = window_state_mut(hwnd) {
                state.handle_scroll(HWND(lparam.0));
            }
            LRESULT(0)
        }
        WM_COMMAND => {
            // Edit boxes also notify on every keystroke and on programmatic
            // text updates; only focus loss commits.
            let notify_code = ((wparam.0 >> 16) & 0xFFFF) as u32;
            if notify_code == EN_KILLFOCUS {
                if let Some(state) = window_state_mut(hwnd) {
                    state.commit_entry((wparam.0 & 0xFFFF) as i32, true);
                }
            }
            LRESULT(0)
        }
        WM_COMMIT_ENTRY => {
            if let Some(state) = window_state_mut(hwnd) {
                state.commit_entry(wparam.0 as i32, false);
            }
            LRESULT(0)
        }
        WM_PAINT => {
            let mut ps = PAINTSTRUCT::default();
            let hdc = BeginPaint(hwnd, &mut ps);
            if let Some(state) = window_state_mut(hwnd) {
                state.paint(hdc);
            }
            let _ = EndPaint(hwnd, &ps);
            LRESULT(0)
        }
        WM_DESTROY => {
            if let Some(state) = window_state_mut(hwnd) {
                state.hwnd = HWND(0);
            }
            PostQuitMessage(0);
            LRESULT(0)
        }
        WM_NCDESTROY => {
            SetWindowLongPtrW(hwnd, GWLP_USERDATA, 0);
            DefWindowProcW(hwnd, msg, wparam, lparam)
        }
        _ => DefWindowProcW(hwnd, msg, wparam, lparam),
    }
}

unsafe fn window_state_mut(hwnd: HWND) -> Option<&'static mut WindowState> {
    let ptr = GetWindowLongPtrW(hwnd, GWLP_USERDATA) as *mut WindowState;
    if ptr.is_null() {
        None
    } else {
        Some(&mut *ptr)
    }
}

/// Edit box subclass: Enter commits the text instead of beeping
unsafe extern "system" fn entry_wnd_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    let original: WNDPROC = std::mem::transmute(GetWindowLongPtrW(hwnd, GWLP_USERDATA));
    let is_return = wparam.0 == VK_RETURN.0 as usize;

    match msg {
        WM_GETDLGCODE if is_return => {
            let code = CallWindowProcW(original, hwnd, msg, wparam, lparam);
            LRESULT(code.0 | DLGC_WANTALLKEYS as isize)
        }
        WM_KEYDOWN if is_return => {
            let _ = PostMessageW(
                GetParent(hwnd),
                WM_COMMIT_ENTRY,
                WPARAM(GetDlgCtrlID(hwnd) as usize),
                LPARAM(0),
            );
            LRESULT(0)
        }
        WM_CHAR if wparam.0 == '\r' as usize => LRESULT(0),
        _ if original.is_none() => DefWindowProcW(hwnd, msg, wparam, lparam),
        _ => CallWindowProcW(original, hwnd, msg, wparam, lparam),
    }
}

impl WindowState {
    fn build_controls(&mut self) -> Result<(), WindowError> {
        for (index, id) in ParameterId::ALL.iter().enumerate() {
            let spec = id.spec();
            let label = create_static(self.hwnd, self.font, spec.label)?;
            let slider = create_trackbar(self.hwnd, ID_SLIDER_BASE + index as i32)?;
            let entry = create_entry(self.hwnd, self.font, ID_ENTRY_BASE + index as i32)?;
            self.rows.push(ControlRow {
                id: *id,
                label,
                slider,
                entry,
            });
            self.sync_row(*id, self.controller.value(*id));
        }

        self.relayout();
        Ok(())
    }

    fn row(&self, id: ParameterId) -> Option<ControlRow> {
        self.rows.iter().copied().find(|row| row.id == id)
    }

    /// Places every control for the current client size and resizes the plot
    fn relayout(&mut self) {
        let mut client = RECT::default();
        unsafe {
            if GetClientRect(self.hwnd, &mut client).is_err() {
                return;
            }
        }
        let dpi_scale = window_dpi_scale(self.hwnd);
        if (dpi_scale - self.font_scale).abs() > f32::EPSILON {
            self.rescale_font(dpi_scale);
        }
        self.layout = WindowLayout::compute(win32_rect_to_rect(&client), dpi_scale);

        for row in &self.layout.rows {
            if let Some(controls) = self.rows.iter().find(|controls| controls.id == row.id) {
                move_control(controls.label, &row.label);
                move_control(controls.slider, &row.slider);
                move_control(controls.entry, &row.entry);
            }
        }

        let canvas = self.layout.canvas;
        let result = self
            .controller
            .resize(canvas.w.max(0) as u32, canvas.h.max(0) as u32, dpi_scale);
        self.after_update(result.map(|_| None));
    }

    /// Swaps in a control font sized for `dpi_scale`
    fn rescale_font(&mut self, dpi_scale: f32) {
        let font = create_control_font(dpi_scale);
        for row in &self.rows {
            apply_font(row.label, font);
            apply_font(row.entry, font);
        }
        release_font(std::mem::replace(&mut self.font, font));
        self.font_scale = dpi_scale;
        debug!(dpi_scale, "control font rescaled");
    }

    fn handle_scroll(&mut self, slider: HWND) {
        let Some(row) = self.rows.iter().copied().find(|row| row.slider == slider) else {
            return;
        };
        let position = unsafe { SendMessageW(slider, TBM_GETPOS, WPARAM(0), LPARAM(0)).0 as i32 };
        let result = self.controller.handle_input(InputEvent::SliderMoved {
            id: row.id,
            position,
        });
        self.after_update(result);
    }

    /// Commits an edit box's text
    ///
    /// With `only_if_edited` the text is skipped unless the user changed it
    /// since it was last written, so leaving an untouched box is a no-op.
    fn commit_entry(&mut self, control_id: i32, only_if_edited: bool) {
        let index = control_id - ID_ENTRY_BASE;
        let Some(id) = usize::try_from(index).ok().and_then(|i| ParameterId::ALL.get(i).copied())
        else {
            return;
        };
        let Some(row) = self.row(id) else {
            return;
        };
        unsafe {
            if only_if_edited && SendMessageW(row.entry, EM_GETMODIFY, WPARAM(0), LPARAM(0)).0 == 0 {
                return;
            }
            SendMessageW(row.entry, EM_SETMODIFY, WPARAM(0), LPARAM(0));
        }
        let text = window_text(row.entry);
        let result = self.controller.handle_input(InputEvent::TextCommitted { id, text });
        self.after_update(result);
    }

    /// Writes queued changes back to the widgets and schedules a repaint
    fn after_update(&mut self, result: Result<Option<ParameterChange>, ControllerError>) {
        match result {
            Ok(Some(change)) => debug!(parameter = change.id.name(), value = change.value, "widgets synced"),
            Ok(None) => {}
            // Already reported by the controller
            Err(ControllerError::Input(_)) => {}
            Err(err) => error!(%err, "plot update failed"),
        }

        let changes: Vec<ParameterChange> = self.pending.borrow_mut().drain(..).collect();
        for change in changes {
            self.sync_row(change.id, change.value);
        }

        if self.controller.surface_mut().take_dirty() {
            let canvas = rect_to_win32_rect(&self.layout.canvas);
            unsafe {
                InvalidateRect(self.hwnd, Some(&canvas as *const RECT), false);
            }
        }
    }

    fn sync_row(&self, id: ParameterId, value: f64) {
        let Some(row) = self.row(id) else {
            return;
        };
        let position = id.spec().to_slider_position(value);
        unsafe {
            SendMessageW(row.slider, TBM_SETPOS, WPARAM(1), LPARAM(position as isize));
        }
        set_window_text(row.entry, &ParameterSpec::format_value(value));
    }

    fn paint(&self, hdc: HDC) {
        let Some(frame) = self.controller.surface().frame() else {
            return;
        };
        let (width, height) = self.controller.renderer().get_pixmap_size(frame);
        let pixels = self.controller.renderer().pixmap_to_bgra(frame);

        let mut bitmap_info = BITMAPINFO::default();
        bitmap_info.bmiHeader = BITMAPINFOHEADER {
            biSize: std::mem::size_of::<BITMAPINFOHEADER>() as u32,
            biWidth: width as i32,
            biHeight: -(height as i32), // top-down rows, same as the pixmap
            biPlanes: 1,
            biBitCount: 32,
            biCompression: BI_RGB.0,
            ..Default::default()
        };

        let canvas = self.layout.canvas;
        unsafe {
            SetDIBitsToDevice(
                hdc,
                canvas.x,
                canvas.y,
                width,
                height,
                0,
                0,
                0,
                height,
                pixels.as_ptr() as *const c_void,
                &bitmap_info,
                DIB_RGB_COLORS,
            );
        }
    }
}

fn apply_font(hwnd: HWND, font: HFONT) {
    unsafe {
        SendMessageW(hwnd, WM_SETFONT, WPARAM(font.0 as usize), LPARAM(1));
    }
}

/// Places a control, hiding it while its slot is collapsed
fn move_control(hwnd: HWND, rect: &Rect) {
    unsafe {
        if rect.is_empty() {
            ShowWindow(hwnd, SW_HIDE);
            return;
        }
        let _ = MoveWindow(hwnd, rect.x, rect.y, rect.w, rect.h, true);
        ShowWindow(hwnd, SW_SHOWNA);
    }
}

/// Creates the label and entry font for `dpi_scale`, or falls back to the stock GUI font
fn create_control_font(dpi_scale: f32) -> HFONT {
    let font = unsafe {
        CreateFontW(
            control_font_height(dpi_scale),
            0,
            0,
            0,
            FW_NORMAL.0 as i32,
            0,
            0,
            0,
            DEFAULT_CHARSET.0 as u32,
            OUT_DEFAULT_PRECIS.0 as u32,
            CLIP_DEFAULT_PRECIS.0 as u32,
            DEFAULT_QUALITY.0 as u32,
            (DEFAULT_PITCH.0 | FF_DONTCARE.0) as u32,
            w!("Segoe UI"),
        )
    };
    if font.0 == 0 {
        warn!(dpi_scale, "control font unavailable, using the stock GUI font");
        return stock_font();
    }
    font
}

fn stock_font() -> HFONT {
    unsafe { HFONT(GetStockObject(DEFAULT_GUI_FONT).0) }
}

/// Deletes a font made by `create_control_font`; the stock font is left alone
fn release_font(font: HFONT) {
    if font.0 != 0 && font != stock_font() {
        unsafe {
            DeleteObject(HGDIOBJ(font.0));
        }
    }
}

/// Right-aligned, vertically centred text next to its slider
fn label_style() -> WINDOW_STYLE {
    WINDOW_STYLE(WS_CHILD.0 | WS_VISIBLE.0 | SS_RIGHT.0 | SS_CENTERIMAGE.0)
}

fn create_static(parent: HWND, font: HFONT, text: &str) -> Result<HWND, WindowError> {
    let hwnd = unsafe {
        CreateWindowExW(
            WINDOW_EX_STYLE(0),
            w!("STATIC"),
            PCWSTR::null(),
            label_style(),
            0,
            0,
            0,
            0,
            parent,
            None,
            None,
            None,
        )
    };
    if hwnd.0 == 0 {
        return Err(WindowError::ControlCreationFailed("label"));
    }
    apply_font(hwnd, font);
    set_window_text(hwnd, text);
    Ok(hwnd)
}

fn create_trackbar(parent: HWND, control_id: i32) -> Result<HWND, WindowError> {
    let hwnd = unsafe {
        let style_bits = WS_CHILD.0 | WS_VISIBLE.0 | WS_TABSTOP.0 | (TBS_HORZ as u32) | (TBS_NOTICKS as u32);
        CreateWindowExW(
            WINDOW_EX_STYLE(0),
            TRACKBAR_CLASSW,
            PCWSTR::null(),
            WINDOW_STYLE(style_bits),
            0,
            0,
            0,
            0,
            parent,
            HMENU(control_id as isize),
            None,
            None,
        )
    };
    if hwnd.0 == 0 {
        return Err(WindowError::ControlCreationFailed("slider"));
    }
    unsafe {
        SendMessageW(hwnd, TBM_SETRANGEMIN, WPARAM(0), LPARAM(0));
        SendMessageW(
            hwnd,
            TBM_SETRANGEMAX,
            WPARAM(1),
            LPARAM(ParameterSpec::SLIDER_STEPS as isize),
        );
        SendMessageW(hwnd, TBM_SETPAGESIZE, WPARAM(0), LPARAM(50));
    }
    Ok(hwnd)
}

fn create_entry(parent: HWND, font: HFONT, control_id: i32) -> Result<HWND, WindowError> {
    let hwnd = unsafe {
        let style_bits = WS_CHILD.0
            | WS_VISIBLE.0
            | WS_BORDER.0
            | WS_TABSTOP.0
            | (ES_AUTOHSCROLL as u32)
            | (ES_RIGHT as u32);
        CreateWindowExW(
            WINDOW_EX_STYLE(0),
            w!("EDIT"),
            PCWSTR::null(),
            WINDOW_STYLE(style_bits),
            0,
            0,
            0,
            0,
            parent,
            HMENU(control_id as isize),
            None,
            None,
        )
    };
    if hwnd.0 == 0 {
        return Err(WindowError::ControlCreationFailed("entry"));
    }
    apply_font(hwnd, font);
    unsafe {
        // The original procedure must be in place before the subclass runs
        let original = GetWindowLongPtrW(hwnd, GWLP_WNDPROC);
        SetWindowLongPtrW(hwnd, GWLP_USERDATA, original);
        SetWindowLongPtrW(hwnd, GWLP_WNDPROC, entry_wnd_proc as usize as isize);
    }
    Ok(hwnd)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_hug_their_sliders() {
        let style = label_style().0;
        assert_ne!(style & SS_RIGHT.0, 0);
        assert_ne!(style & SS_CENTERIMAGE.0, 0);
        assert_ne!(style & WS_VISIBLE.0, 0);
    }
}
