use crate::signal::{ObjectKind, SimObject};
use crate::SimpleResult;
use lazy_static::lazy_static;

lazy_static! {
    pub static ref SIM_IF: Box<dyn SimIf + Sync> = new_interface();
}

fn new_interface() -> Box<dyn SimIf + Sync> {
    Box::new(crate::sim::BehavSim)
}

pub trait SimIf {
    fn set_value_u32(&self, obj: &SimObject, value: u32) -> SimpleResult<()>;
    fn get_value_u32(&self, obj: &SimObject) -> SimpleResult<u32>;
    fn get_value_bin(&self, obj: &SimObject) -> SimpleResult<String>;
    fn get_object_by_name(&self, name: &str) -> SimpleResult<SimObject>;
    fn get_sim_time_steps(&self) -> u64;
    fn log(&self, msg: &str);
    fn get_size(&self, obj_handle: usize) -> i32;
    fn get_kind(&self, obj_handle: usize) -> ObjectKind;
    fn get_full_name(&self, obj: &SimObject) -> SimpleResult<String>;
    fn get_sim_precision(&self) -> i8;
    fn get_root_object(&self) -> SimpleResult<SimObject>;
    fn register_callback_rw(&self) -> SimpleResult<usize>;
    fn register_callback_ro(&self) -> SimpleResult<usize>;
    fn register_callback_time(&self, t: u64) -> SimpleResult<usize>;
    fn register_callback_edge(&self, sig_hdl: usize) -> SimpleResult<usize>;
    fn cancel_callback(&self, cb_hdl: usize) -> SimpleResult<()>;
    fn get_sim_time(&self, unit: &str) -> f64 {
        // this function does not preserve precision, so don't use carelessly
        let t = self.get_sim_time_steps() as f64;
        let precision = self.get_sim_precision();
        ldexp10(t, precision - time_scale(unit).unwrap())
    }
    fn get_sim_steps(&self, time: f64, unit: &str) -> u64 {
        let precision = self.get_sim_precision();
        let steps = ldexp10(time, time_scale(unit).unwrap() - precision);
        if steps % 1.0 == 0.0 {
            steps as u64
        } else {
            panic!(
                "Can't convert time {} {} to sim steps without rounding (sim precision: {})",
                time,
                unit,
                scale_time(precision).unwrap()
            );
        }
    }
}

fn time_scale(unit: &str) -> SimpleResult<i8> {
    match unit {
        "fs" => Ok(-15),
        "ps" => Ok(-12),
        "ns" => Ok(-9),
        "us" => Ok(-6),
        "ms" => Ok(-3),
        "sec" => Ok(0),
        _ => Err(()),
    }
}
fn scale_time(unit: i8) -> SimpleResult<String> {
    match unit {
        -15 => Ok("fs".to_string()),
        -12 => Ok("ps".to_string()),
        -9 => Ok("ns".to_string()),
        -6 => Ok("us".to_string()),
        -3 => Ok("ms".to_string()),
        0 => Ok("sec".to_string()),
        _ => Err(()),
    }
}

fn ldexp10(frac: f64, exp: i8) -> f64 {
    // Like math.ldexp, but base 10
    if exp >= 0 {
        frac * 10_u64.pow(exp as u32) as f64
    } else {
        let div = 10_u64.pow(-exp as u32) as f64;
        frac / div
    }
}
