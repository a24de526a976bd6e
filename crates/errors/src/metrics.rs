use metrics::register_trigemu_counter;

register_trigemu_counter!(pub CONFIGURATION_FAULT_TOTAL, "Count of configuration faults raised");
register_trigemu_counter!(pub TRIGGER_INTERVAL_FAULT_TOTAL, "Count of invalid trigger interval faults raised");

pub fn log_configuration_fault() {
    CONFIGURATION_FAULT_TOTAL.inc();
}

pub fn log_trigger_interval_fault() {
    TRIGGER_INTERVAL_FAULT_TOTAL.inc();
}
