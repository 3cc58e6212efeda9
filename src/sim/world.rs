//! 世界 trait
//!
//! 定义仿真世界接口。

use super::simulator::Simulator;
use std::any::Any;

/// 仿真世界：由业务层实现（例如应用状态/统计等），运行时以 `&mut dyn World` 交给每个事件。
pub trait World: Any {
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn on_tick(&mut self, _sim: &mut Simulator) {}
}

/// 空世界：事件只依赖闭包捕获的状态时使用。
impl World for () {
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
