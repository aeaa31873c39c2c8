mod link_state;
mod network_integration;
mod prefix;
mod routing_table;
mod sim_time;
