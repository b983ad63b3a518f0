//! Windows host binding: a `WH_KEYBOARD_LL` hook on the bootstrap thread.
//!
//! Low-level hook procedures receive no user data, so the handler lives in a
//! process-wide slot that is filled on install and emptied when the guard drops.
//! Every event is passed on with `CallNextHookEx`.

use std::sync::atomic::{AtomicBool, AtomicIsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use log::{debug, info};
use windows::Win32::Foundation::{HINSTANCE, LPARAM, LRESULT, WPARAM};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::Input::KeyboardAndMouse::{
    GetAsyncKeyState, VIRTUAL_KEY, VK_CONTROL, VK_DOWN, VK_LEFT, VK_MENU, VK_RIGHT, VK_SHIFT,
    VK_UP,
};
use windows::Win32::UI::WindowsAndMessaging::{
    CallNextHookEx, DispatchMessageW, GetMessageW, HHOOK, KBDLLHOOKSTRUCT, KillTimer, MSG,
    SetTimer, SetWindowsHookExW, TranslateMessage, UnhookWindowsHookEx, WH_KEYBOARD_LL,
    WM_KEYDOWN, WM_SYSKEYDOWN,
};

use super::{EVENT_LOOP_TICK, InterceptError, Key, KeyEventHandler, Modifiers};

const VK_C: u16 = 0x43;
const ERROR_ACCESS_DENIED: u32 = 5;

static HOOK: AtomicIsize = AtomicIsize::new(0);
static HANDLER: Mutex<Option<Arc<dyn KeyEventHandler>>> = Mutex::new(None);

/// Unhooks on drop.
pub struct InterceptGuard {
    hook: HHOOK,
}

impl Drop for InterceptGuard {
    fn drop(&mut self) {
        HOOK.store(0, Ordering::SeqCst);
        unsafe {
            let _ = UnhookWindowsHookEx(self.hook);
        }
        *HANDLER.lock().unwrap_or_else(PoisonError::into_inner) = None;
        info!("Keyboard hook removed");
    }
}

pub fn install(handler: Arc<dyn KeyEventHandler>) -> Result<InterceptGuard, InterceptError> {
    *HANDLER.lock().unwrap_or_else(PoisonError::into_inner) = Some(handler);

    let installed = unsafe {
        GetModuleHandleW(None).and_then(|module| {
            let hinst: HINSTANCE = module.into();
            SetWindowsHookExW(WH_KEYBOARD_LL, Some(hook_proc), hinst, 0)
        })
    };

    match installed {
        Ok(hook) => {
            HOOK.store(hook.0 as isize, Ordering::SeqCst);
            info!("Keyboard hook installed: 0x{:X}", hook.0 as usize);
            Ok(InterceptGuard { hook })
        }
        Err(e) => {
            *HANDLER.lock().unwrap_or_else(PoisonError::into_inner) = None;
            let message = e.message().to_string();
            if e.code().0 as u32 & 0xFFFF == ERROR_ACCESS_DENIED {
                Err(InterceptError::PermissionDenied(message))
            } else {
                Err(InterceptError::Os(message))
            }
        }
    }
}

/// Pumps the thread's message queue (hook callbacks are delivered from it).
/// A thread timer wakes `GetMessageW` regularly so shutdown is noticed.
pub fn run_event_loop(shutdown: &AtomicBool) {
    debug!("Entering message loop");
    unsafe {
        let timer = SetTimer(None, 0, EVENT_LOOP_TICK.as_millis() as u32, None);
        let mut msg = MSG::default();
        while !shutdown.load(Ordering::Acquire) && GetMessageW(&mut msg, None, 0, 0).as_bool() {
            let _ = TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }
        if timer != 0 {
            let _ = KillTimer(None, timer);
        }
    }
    debug!("Left message loop");
}

unsafe extern "system" fn hook_proc(code: i32, wp: WPARAM, lp: LPARAM) -> LRESULT {
    let hook = HHOOK(HOOK.load(Ordering::SeqCst) as *mut _);

    // Negative code = must pass through per contract
    if code < 0 {
        return unsafe { CallNextHookEx(hook, code, wp, lp) };
    }

    let msg = wp.0 as u32;
    if msg == WM_KEYDOWN || msg == WM_SYSKEYDOWN {
        let kbd = unsafe { &*(lp.0 as *const KBDLLHOOKSTRUCT) };
        let modifiers = Modifiers {
            primary: key_down(VK_CONTROL),
            alt: key_down(VK_MENU),
            shift: key_down(VK_SHIFT),
        };
        let key = translate(kbd.vkCode);

        let handler = HANDLER
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(handler) = handler {
            if handler.on_key_event(modifiers, key) {
                return LRESULT(1);
            }
        }
    }

    unsafe { CallNextHookEx(hook, code, wp, lp) }
}

fn key_down(key: VIRTUAL_KEY) -> bool {
    unsafe { GetAsyncKeyState(key.0 as i32) < 0 }
}

fn translate(vk: u32) -> Key {
    let code = vk as u16;
    if code == VK_C {
        Key::C
    } else if code == VK_LEFT.0 {
        Key::Left
    } else if code == VK_RIGHT.0 {
        Key::Right
    } else if code == VK_UP.0 {
        Key::Up
    } else if code == VK_DOWN.0 {
        Key::Down
    } else {
        Key::Other(vk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_known_keys() {
        assert_eq!(translate(0x43), Key::C);
        assert_eq!(translate(VK_LEFT.0 as u32), Key::Left);
        assert_eq!(translate(VK_DOWN.0 as u32), Key::Down);
        assert_eq!(translate(0x56), Key::Other(0x56));
    }
}
