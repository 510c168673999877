//! Background loops: one writer for the routing plan, readers for planning.

pub mod planning_loop;
pub mod pose_loop;
pub mod routing_update_loop;
